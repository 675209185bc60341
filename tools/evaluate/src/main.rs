//! Evaluation CLI Tool
//!
//! Runs a pre-trained binary image classifier over a held-out test set,
//! selects the Youden-optimal threshold and writes the ROC and confusion
//! matrix charts plus optional JSON/CSV reports.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bineval_core::report::{
    export_confusion_matrix_csv, export_predictions_csv, export_summary_json, RunInfo,
    CONFUSION_MATRIX_CSV, PREDICTIONS_CSV, SUMMARY_FILE,
};
use bineval_core::{setup_cli_logging, EvalConfig, EvaluationSummary};
use bineval_dataset::{EvalBatcher, EvalDataset};
use bineval_model::{
    backend_name, default_device, load_classifier, seed_backend, DefaultBackend, Evaluator,
    InferenceOutput, InferenceRunner,
};
use clap::Parser;
use colored::Colorize;
use tracing::info;

/// Binary Classifier Evaluation Tool
#[derive(Parser, Debug)]
#[command(
    name = "evaluate",
    about = "Evaluate a trained binary image classifier",
    long_about = "Run a trained classifier over a held-out test set, pick the operating \
                  threshold that maximizes Youden's index and report accuracy, precision, \
                  recall and F1 together with ROC and confusion matrix charts."
)]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, value_name = "FILE", default_value = "config/evaluate.toml")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_cli_logging(args.verbose)?;

    info!("Binary Classifier - Evaluation Tool");
    info!("===================================");

    let config = EvalConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    std::fs::create_dir_all(&config.output.testing_images)
        .context("Failed to create images directory")?;
    if let Some(report_dir) = &config.output.report_dir {
        std::fs::create_dir_all(report_dir).context("Failed to create report directory")?;
    }

    seed_backend(config.seed);
    let device = default_device();
    info!("Backend: {}", backend_name());

    let dataset = EvalDataset::open(&config.dataset, &config.labels.class_names)
        .context("Failed to load test dataset")?;
    let [negatives, positives] = dataset.class_counts();
    info!(
        "Test set: {} samples ({} {}, {} {})",
        dataset.len(),
        negatives,
        config.labels.class_names[0],
        positives,
        config.labels.class_names[1]
    );

    info!("Loading model: {}", config.model.model_file.display());
    let model = load_classifier::<DefaultBackend>(
        &config.model,
        config.dataset.image_size.channels as usize,
        &device,
    )
    .context("Failed to load model")?;

    let batcher = EvalBatcher::<DefaultBackend>::new(device, config.dataset.image_size)
        .with_normalization(config.dataset.normalization.clone());
    let runner = InferenceRunner::new(batcher, config.dataset.batch_size)?.with_progress(true);
    let evaluator = Evaluator::new(
        model,
        runner,
        config.output.clone(),
        config.labels.clone(),
    );

    info!("Running evaluation...");
    let output = evaluator.test(&dataset).context("Inference failed")?;
    let summary = evaluator
        .find_best_threshold_and_produce_metrics(&output)
        .context("Failed to compute metrics")?;

    print_results(&summary, &output);

    if let Some(report_dir) = &config.output.report_dir {
        export_results(&config, report_dir, &summary, &output)?;
    }

    info!("Evaluation completed successfully!");
    info!("Charts saved to: {}", config.output.testing_images.display());

    Ok(())
}

fn print_results(summary: &EvaluationSummary, output: &InferenceOutput) {
    println!();
    println!("{}", "Evaluation Results:".cyan().bold());
    println!(
        "  Processed {} samples in {:.2} seconds ({} batches)",
        output.num_samples(),
        output.elapsed.as_secs_f64(),
        output.num_batches
    );
    println!("  {} {}", "AUC:".green(), format!("{:.4}", summary.auc).bold());
    println!(
        "  {} {}",
        "Best Threshold (Youden's Index):".green(),
        format!("{:.4}", summary.selection.threshold).bold()
    );
    println!(
        "  Confusion matrix: TN {} | FP {} | FN {} | TP {}",
        summary.confusion_matrix.true_negatives,
        summary.confusion_matrix.false_positives,
        summary.confusion_matrix.false_negatives,
        summary.confusion_matrix.true_positives
    );
    println!("  {}", summary.metrics.to_string().bold());
    println!();
}

fn export_results(
    config: &EvalConfig,
    report_dir: &std::path::Path,
    summary: &EvaluationSummary,
    output: &InferenceOutput,
) -> Result<()> {
    let class_names = &config.labels.class_names;
    let run = RunInfo::from_config(config, output.elapsed.as_secs_f64());

    export_summary_json(summary, &run, class_names, &report_dir.join(SUMMARY_FILE))
        .context("Failed to export summary")?;

    if config.output.export_confusion_matrix {
        export_confusion_matrix_csv(
            &summary.confusion_matrix,
            class_names,
            &report_dir.join(CONFUSION_MATRIX_CSV),
        )
        .context("Failed to export confusion matrix")?;
    }

    if config.output.save_predictions {
        export_predictions_csv(
            &output.labels,
            &output.predictions,
            summary.selection.threshold,
            &report_dir.join(PREDICTIONS_CSV),
        )
        .context("Failed to export predictions")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_config() {
        let args = Args::parse_from(["evaluate"]);
        assert_eq!(args.config, PathBuf::from("config/evaluate.toml"));
        assert!(!args.verbose);

        let args = Args::parse_from(["evaluate", "--config", "run.toml", "-v"]);
        assert_eq!(args.config, PathBuf::from("run.toml"));
        assert!(args.verbose);
    }
}
