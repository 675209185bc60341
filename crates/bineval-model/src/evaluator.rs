//! End-to-end evaluation of a binary classifier.
//!
//! `test` collects probabilities over the dataset; the threshold step picks
//! the Youden-optimal cut, draws the ROC and confusion matrix charts and
//! reports the rounded metrics.

use bineval_core::charts::{draw_confusion_matrix, draw_roc_curve};
use bineval_core::{evaluate_scores, EvaluationSummary, LabelConfig, OutputConfig, Result};
use bineval_dataset::EvalDataset;
use burn::tensor::backend::Backend;
use tracing::info;

use crate::runner::{InferenceOutput, InferenceRunner, ProbabilityModel};

/// Groups a model, its runner and where the charts go
pub struct Evaluator<B: Backend, M: ProbabilityModel<B>> {
    model: M,
    runner: InferenceRunner<B>,
    output: OutputConfig,
    labels: LabelConfig,
}

impl<B: Backend, M: ProbabilityModel<B>> Evaluator<B, M> {
    pub fn new(model: M, runner: InferenceRunner<B>, output: OutputConfig, labels: LabelConfig) -> Self {
        Self {
            model,
            runner,
            output,
            labels,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run the model over every sample
    pub fn test(&self, dataset: &EvalDataset) -> Result<InferenceOutput> {
        info!(
            "Starting evaluation on {} samples (batch size {})",
            dataset.len(),
            self.runner.batch_size()
        );
        self.runner.run(&self.model, dataset)
    }

    /// Choose the threshold, draw both charts and compute the metrics.
    pub fn find_best_threshold_and_produce_metrics(
        &self,
        output: &InferenceOutput,
    ) -> Result<EvaluationSummary> {
        let summary = evaluate_scores(&output.labels, &output.predictions)?;

        let roc_path = self.output.roc_curve_path();
        draw_roc_curve(&summary.roc_curve, summary.auc, &roc_path)?;
        info!("ROC curve saved to: {}", roc_path.display());

        info!(
            "Best Threshold (Youden's Index): {:.4}",
            summary.selection.threshold
        );

        let cm_path = self.output.confusion_matrix_path();
        let title = format!(
            "Confusion Matrix at Best Threshold ({}) {:.2}",
            self.labels.positive_name, summary.selection.threshold
        );
        draw_confusion_matrix(
            &summary.confusion_matrix,
            &["0".to_string(), "1".to_string()],
            &title,
            &cm_path,
        )?;
        info!("Confusion matrix saved to: {}", cm_path.display());

        info!("{}", summary.metrics);
        Ok(summary)
    }
}
