//! JSON and CSV exports of an evaluation run.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::EvalConfig;
use crate::error::Result;
use crate::metrics::{binarize, ConfusionMatrix, EvaluationSummary};
use crate::types::ModelArchitecture;

/// File names written into the report directory
pub const SUMMARY_FILE: &str = "evaluation_summary.json";
pub const CONFUSION_MATRIX_CSV: &str = "confusion_matrix.csv";
pub const PREDICTIONS_CSV: &str = "predictions.csv";

/// Run information stored alongside the metrics
#[derive(Debug, Clone, Serialize)]
pub struct RunInfo {
    pub generated_at: DateTime<Utc>,
    pub model_file: PathBuf,
    pub architecture: ModelArchitecture,
    pub test_path: PathBuf,
    pub batch_size: usize,
    pub inference_seconds: f64,
}

impl RunInfo {
    pub fn from_config(config: &EvalConfig, inference_seconds: f64) -> Self {
        Self {
            generated_at: Utc::now(),
            model_file: config.model.model_file.clone(),
            architecture: config.model.architecture,
            test_path: config.dataset.test_path(),
            batch_size: config.dataset.batch_size,
            inference_seconds,
        }
    }
}

#[derive(Serialize)]
struct SummaryDocument<'a> {
    run: &'a RunInfo,
    class_names: &'a [String; 2],
    #[serde(flatten)]
    summary: &'a EvaluationSummary,
}

/// Write the summary document as pretty JSON
pub fn export_summary_json(
    summary: &EvaluationSummary,
    run: &RunInfo,
    class_names: &[String; 2],
    path: &Path,
) -> Result<()> {
    let document = SummaryDocument {
        run,
        class_names,
        summary,
    };
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json)?;
    info!("Summary exported to: {}", path.display());
    Ok(())
}

/// Write the 2x2 matrix with actual classes as rows
pub fn export_confusion_matrix_csv(
    matrix: &ConfusionMatrix,
    class_names: &[String; 2],
    path: &Path,
) -> Result<()> {
    let mut csv = String::from("True\\Predicted");
    for name in class_names {
        csv.push(',');
        csv.push_str(name);
    }
    csv.push('\n');

    for (name, row) in class_names.iter().zip(matrix.rows()) {
        csv.push_str(name);
        for count in row {
            let _ = write!(csv, ",{count}");
        }
        csv.push('\n');
    }

    fs::write(path, csv)?;
    info!("Confusion matrix exported to: {}", path.display());
    Ok(())
}

/// Write one row per sample with its score and the decision at `threshold`
pub fn export_predictions_csv(
    labels: &[u8],
    scores: &[f64],
    threshold: f64,
    path: &Path,
) -> Result<()> {
    let predicted = binarize(scores, threshold);
    let mut csv = String::from("index,label,probability,predicted,correct\n");
    for (i, ((label, score), pred)) in labels.iter().zip(scores).zip(&predicted).enumerate() {
        let _ = writeln!(csv, "{i},{label},{score:.6},{pred},{}", label == pred);
    }

    fs::write(path, csv)?;
    info!("Predictions exported to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::evaluate_scores;
    use tempfile::TempDir;

    fn names() -> [String; 2] {
        ["normal".to_string(), "abnormal".to_string()]
    }

    #[test]
    fn test_export_confusion_matrix_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFUSION_MATRIX_CSV);
        let matrix = ConfusionMatrix {
            true_negatives: 5,
            false_positives: 1,
            false_negatives: 2,
            true_positives: 7,
        };

        export_confusion_matrix_csv(&matrix, &names(), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "True\\Predicted,normal,abnormal\nnormal,5,1\nabnormal,2,7\n"
        );
    }

    #[test]
    fn test_export_predictions_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PREDICTIONS_CSV);

        export_predictions_csv(&[0, 1, 1], &[0.2, 0.7, 0.4], 0.5, &path).unwrap();
        let lines: Vec<String> = fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(String::from)
            .collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "0,0,0.200000,0,true");
        assert_eq!(lines[2], "1,1,0.700000,1,true");
        assert_eq!(lines[3], "2,1,0.400000,0,false");
    }

    #[test]
    fn test_export_summary_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SUMMARY_FILE);
        let summary = evaluate_scores(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]).unwrap();
        let run = RunInfo::from_config(&EvalConfig::default(), 1.5);

        export_summary_json(&summary, &run, &names(), &path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(value["num_samples"], 4);
        assert_eq!(value["auc"], 0.75);
        assert_eq!(value["run"]["architecture"], "small_cnn");
        assert_eq!(value["class_names"][1], "abnormal");
        // the leading +inf threshold has no JSON representation
        assert!(value["roc_curve"]["thresholds"][0].is_null());
    }
}
