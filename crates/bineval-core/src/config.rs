//! Configuration structures for an evaluation run.
//!
//! Every section carries defaults so a TOML file only needs to name what
//! differs from them.

use crate::cli::load_toml_config;
use crate::error::{Error, Result};
use crate::types::{ChannelStats, DatasetFormat, ImageDimensions, ModelArchitecture};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the ROC curve plot
pub const ROC_CURVE_FILE: &str = "ROC_curve.png";
/// File name of the confusion matrix plot
pub const CONFUSION_MATRIX_FILE: &str = "Confusion_matrix.png";

/// Top-level configuration for an evaluation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Test set location and shape
    pub dataset: DatasetConfig,
    /// Architecture and weights
    pub model: ModelConfig,
    /// Where plots and reports are written
    pub output: OutputConfig,
    /// Display names for the two classes
    pub labels: LabelConfig,
    /// Random seed passed to the backend
    pub seed: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            model: ModelConfig::default(),
            output: OutputConfig::default(),
            labels: LabelConfig::default(),
            seed: 1,
        }
    }
}

impl EvalConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let config: EvalConfig = load_toml_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.dataset.batch_size == 0 {
            return Err(Error::Config("Batch size must be greater than 0".to_string()));
        }

        let dims = self.dataset.image_size;
        if dims.width == 0 || dims.height == 0 {
            return Err(Error::Config(format!(
                "Image size must be non-zero, got {}x{}",
                dims.width, dims.height
            )));
        }
        if !matches!(dims.channels, 1 | 3) {
            return Err(Error::Config(format!(
                "Image channels must be 1 or 3, got {}",
                dims.channels
            )));
        }

        if let Some(stats) = &self.dataset.normalization {
            let channels = dims.channels as usize;
            if stats.mean.len() != channels || stats.std.len() != channels {
                return Err(Error::Config(format!(
                    "Normalization needs {} mean/std values, got {}/{}",
                    channels,
                    stats.mean.len(),
                    stats.std.len()
                )));
            }
            if stats.std.iter().any(|s| *s <= 0.0) {
                return Err(Error::Config("Normalization std must be positive".to_string()));
            }
        }

        if self.model.base_filters == 0 {
            return Err(Error::Config("Base filters must be greater than 0".to_string()));
        }

        if !(0.0..1.0).contains(&self.model.dropout) {
            return Err(Error::Config(format!(
                "Dropout must be in [0, 1), got {}",
                self.model.dropout
            )));
        }

        Ok(())
    }
}

/// Test set configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory holding the dataset files
    pub dataset_folder: PathBuf,
    /// Test file (records) or directory (folder), relative to `dataset_folder`
    pub test_file: PathBuf,
    /// On-disk format
    pub format: DatasetFormat,
    /// Batch size for inference
    pub batch_size: usize,
    /// Model input dimensions
    pub image_size: ImageDimensions,
    /// Optional per-channel normalization
    pub normalization: Option<ChannelStats>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            dataset_folder: PathBuf::from("data"),
            test_file: PathBuf::from("test.jsonl"),
            format: DatasetFormat::Records,
            batch_size: 128,
            image_size: ImageDimensions::default(),
            normalization: None,
        }
    }
}

impl DatasetConfig {
    /// Full path of the test set
    pub fn test_path(&self) -> PathBuf {
        self.dataset_folder.join(&self.test_file)
    }
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Architecture type
    pub architecture: ModelArchitecture,
    /// Path to the recorded weights
    pub model_file: PathBuf,
    /// Dropout rate the network was built with
    pub dropout: f64,
    /// Filters in the first small_cnn block; must match the saved weights
    pub base_filters: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            architecture: ModelArchitecture::SmallCnn,
            model_file: PathBuf::from("models/classifier.mpk"),
            dropout: 0.3,
            base_filters: 16,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the ROC and confusion matrix plots
    pub testing_images: PathBuf,
    /// Directory receiving the JSON summary and CSV exports
    pub report_dir: Option<PathBuf>,
    /// Export the confusion matrix as CSV
    pub export_confusion_matrix: bool,
    /// Export per-sample predictions as CSV
    pub save_predictions: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            testing_images: PathBuf::from("images/testing"),
            report_dir: None,
            export_confusion_matrix: false,
            save_predictions: false,
        }
    }
}

impl OutputConfig {
    pub fn roc_curve_path(&self) -> PathBuf {
        self.testing_images.join(ROC_CURVE_FILE)
    }

    pub fn confusion_matrix_path(&self) -> PathBuf {
        self.testing_images.join(CONFUSION_MATRIX_FILE)
    }
}

/// Class naming used in folders, plots and exports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Names for label 0 and label 1
    pub class_names: [String; 2],
    /// Name of the positive class shown in plot titles
    pub positive_name: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            class_names: ["normal".to_string(), "abnormal".to_string()],
            positive_name: "Abnormal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_eval_config() {
        let config = EvalConfig::default();
        assert_eq!(config.seed, 1);
        assert_eq!(config.dataset.batch_size, 128);
        assert_eq!(config.model.architecture, ModelArchitecture::SmallCnn);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EvalConfig = toml::from_str(
            r#"
            [dataset]
            dataset_folder = "/data/xray"
            test_file = "test"
            format = "folder"
            image_size = { width = 128, height = 128, channels = 1 }

            [model]
            architecture = "alexnet"
            "#,
        )
        .unwrap();

        assert_eq!(config.dataset.format, DatasetFormat::Folder);
        assert_eq!(config.dataset.batch_size, 128);
        assert_eq!(config.dataset.test_path(), PathBuf::from("/data/xray/test"));
        assert_eq!(config.model.architecture, ModelArchitecture::AlexNet);
        assert_eq!(config.labels.positive_name, "Abnormal");
        assert!(config.output.report_dir.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let mut config = EvalConfig::default();
        config.dataset.batch_size = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_mismatched_normalization() {
        let mut config = EvalConfig::default();
        config.dataset.normalization = Some(ChannelStats {
            mean: vec![0.5],
            std: vec![0.5],
        });
        assert!(config.validate().is_err());

        config.dataset.normalization = Some(ChannelStats {
            mean: vec![0.485, 0.456, 0.406],
            std: vec![0.229, 0.224, 0.225],
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_base_filters() {
        let mut config = EvalConfig::default();
        assert_eq!(config.model.base_filters, 16);
        config.model.base_filters = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_two_channels() {
        let mut config = EvalConfig::default();
        config.dataset.image_size = ImageDimensions::new(32, 32, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_paths() {
        let output = OutputConfig {
            testing_images: PathBuf::from("out"),
            ..OutputConfig::default()
        };
        assert_eq!(output.roc_curve_path(), PathBuf::from("out/ROC_curve.png"));
        assert_eq!(
            output.confusion_matrix_path(),
            PathBuf::from("out/Confusion_matrix.png")
        );
    }

    #[test]
    fn test_load_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("evaluate.toml");
        fs::write(&path, "[dataset]\nbatch_size = 0\n").unwrap();
        assert!(EvalConfig::load(&path).is_err());

        fs::write(&path, "seed = 7\n[dataset]\nbatch_size = 16\n").unwrap();
        let config = EvalConfig::load(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.dataset.batch_size, 16);
    }
}
