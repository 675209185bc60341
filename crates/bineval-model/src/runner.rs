//! Batched inference over the test set.

use std::time::{Duration, Instant};

use bineval_core::{validate_labels, validate_predictions, Error, Result};
use bineval_dataset::{EvalBatcher, EvalDataset};
use burn::data::dataloader::batcher::Batcher;
use burn::tensor::{backend::Backend, Tensor};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::model::BinaryClassifier;

/// Anything that maps a batch of images to positive-class probabilities.
pub trait ProbabilityModel<B: Backend> {
    /// `images` is [batch_size, channels, height, width]; returns [batch_size]
    fn predict_proba(&self, images: Tensor<B, 4>) -> Tensor<B, 1>;
}

impl<B: Backend> ProbabilityModel<B> for BinaryClassifier<B> {
    fn predict_proba(&self, images: Tensor<B, 4>) -> Tensor<B, 1> {
        BinaryClassifier::predict_proba(self, images)
    }
}

/// Predictions and labels in dataset order
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub predictions: Vec<f64>,
    pub labels: Vec<u8>,
    pub elapsed: Duration,
    pub num_batches: usize,
}

impl InferenceOutput {
    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }
}

/// Runs a model over the dataset in sequential, index-ordered batches.
#[derive(Clone, Debug)]
pub struct InferenceRunner<B: Backend> {
    batcher: EvalBatcher<B>,
    batch_size: usize,
    show_progress: bool,
}

impl<B: Backend> InferenceRunner<B> {
    pub fn new(batcher: EvalBatcher<B>, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Config("Batch size must be greater than 0".to_string()));
        }

        Ok(Self {
            batcher,
            batch_size,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Collect every probability and label, then check their ranges.
    pub fn run<M: ProbabilityModel<B>>(&self, model: &M, dataset: &EvalDataset) -> Result<InferenceOutput> {
        let total = dataset.len();
        let progress = if self.show_progress {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} samples ({eta})")
                    .map_err(|e| Error::Config(format!("Invalid progress template: {e}")))?
                    .progress_chars("=>-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut predictions = Vec::with_capacity(total);
        let mut labels = Vec::with_capacity(total);
        let mut num_batches = 0;

        let start = Instant::now();
        for batch_start in (0..total).step_by(self.batch_size) {
            let batch_end = (batch_start + self.batch_size).min(total);
            let items = (batch_start..batch_end)
                .map(|index| dataset.load_item(index))
                .collect::<Result<Vec<_>>>()?;
            let batch = self.batcher.batch(items);

            let probs = model
                .predict_proba(batch.images)
                .into_data()
                .convert::<f32>()
                .to_vec::<f32>()
                .map_err(|e| Error::Model(format!("Failed to read predictions: {e:?}")))?;
            let targets = batch
                .targets
                .into_data()
                .convert::<i64>()
                .to_vec::<i64>()
                .map_err(|e| Error::Dataset(format!("Failed to read labels: {e:?}")))?;

            if probs.len() != targets.len() {
                return Err(Error::Model(format!(
                    "Model returned {} predictions for a batch of {}",
                    probs.len(),
                    targets.len()
                )));
            }

            predictions.extend(probs.into_iter().map(f64::from));
            for target in targets {
                let label = u8::try_from(target)
                    .map_err(|_| Error::InvalidInput(format!("label {target} is not 0 or 1")))?;
                labels.push(label);
            }

            num_batches += 1;
            progress.set_position(batch_end as u64);
            debug!("Batch {} done ({} samples)", num_batches, batch_end - batch_start);
        }
        let elapsed = start.elapsed();
        progress.finish_and_clear();

        validate_predictions(&predictions)?;
        validate_labels(&labels)?;

        info!(
            "Processed {} samples in {:.2} seconds",
            labels.len(),
            elapsed.as_secs_f64()
        );

        Ok(InferenceOutput {
            predictions,
            labels,
            elapsed,
            num_batches,
        })
    }
}
