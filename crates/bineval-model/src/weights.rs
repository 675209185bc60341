//! Loading and saving classifier weights.
//!
//! Weights are stored with Burn's `CompactRecorder` (half-precision
//! MessagePack); the recorder always writes the `.mpk` extension.

use std::fs;
use std::path::{Path, PathBuf};

use bineval_core::{Error, ModelConfig, Result};
use burn::{module::Module, record::CompactRecorder, tensor::backend::Backend};
use tracing::info;

use crate::model::{BinaryClassifier, ClassifierConfig};

/// Path the recorder actually reads or writes for `path`
pub fn weights_path(path: &Path) -> PathBuf {
    path.with_extension("mpk")
}

/// Build the configured architecture and load its weights.
pub fn load_classifier<B: Backend>(
    config: &ModelConfig,
    in_channels: usize,
    device: &B::Device,
) -> Result<BinaryClassifier<B>> {
    let path = weights_path(&config.model_file);
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Model weights not found: {}",
            path.display()
        )));
    }

    let model = ClassifierConfig::new(config.architecture)
        .with_in_channels(in_channels)
        .with_dropout(config.dropout)
        .with_base_filters(config.base_filters)
        .init::<B>(device);

    let model = model
        .load_file(&path, &CompactRecorder::new(), device)
        .map_err(|e| Error::Model(format!("Failed to load {}: {e:?}", path.display())))?;

    info!("Loaded {} weights from {}", config.architecture, path.display());
    Ok(model)
}

/// Record `model` at `path`, returning the file actually written.
pub fn save_classifier<B: Backend>(model: &BinaryClassifier<B>, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    model
        .clone()
        .save_file(path, &CompactRecorder::new())
        .map_err(|e| Error::Model(format!("Failed to save {}: {e:?}", path.display())))?;

    let written = weights_path(path);
    info!("Saved {} weights to {}", model.architecture(), written.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bineval_core::ModelArchitecture;
    use burn::tensor::{Distribution, Tensor};
    use burn_ndarray::{NdArray, NdArrayDevice};
    use tempfile::TempDir;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_weights_path_extension() {
        assert_eq!(weights_path(Path::new("models/net")), PathBuf::from("models/net.mpk"));
        assert_eq!(weights_path(Path::new("a/net.mpk")), PathBuf::from("a/net.mpk"));
    }

    #[test]
    fn test_load_missing_weights() {
        let config = ModelConfig {
            model_file: PathBuf::from("/nonexistent/classifier.mpk"),
            ..ModelConfig::default()
        };
        let result = load_classifier::<TestBackend>(&config, 3, &NdArrayDevice::Cpu);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_save_then_load_preserves_predictions() {
        let dir = TempDir::new().unwrap();
        let device = NdArrayDevice::Cpu;
        let model = ClassifierConfig::new(ModelArchitecture::SmallCnn)
            .with_in_channels(1)
            .with_base_filters(4)
            .init::<TestBackend>(&device);

        let written = save_classifier(&model, &dir.path().join("nested").join("classifier")).unwrap();
        assert!(written.exists());

        let config = ModelConfig {
            architecture: ModelArchitecture::SmallCnn,
            model_file: written,
            dropout: 0.3,
            base_filters: 4,
        };
        let loaded = load_classifier::<TestBackend>(&config, 1, &device).unwrap();

        let images = Tensor::<TestBackend, 4>::random([2, 1, 16, 16], Distribution::Default, &device);
        let before = model.predict_proba(images.clone()).into_data().convert::<f32>().to_vec::<f32>().unwrap();
        let after = loaded.predict_proba(images).into_data().convert::<f32>().to_vec::<f32>().unwrap();

        // half-precision storage
        for (b, a) in before.iter().zip(&after) {
            assert!((b - a).abs() < 1e-2, "{b} vs {a}");
        }
    }

    #[test]
    fn test_load_classifier_default_architecture() {
        let dir = TempDir::new().unwrap();
        let device = NdArrayDevice::Cpu;
        let model = ClassifierConfig::new(ModelArchitecture::SmallCnn).init::<TestBackend>(&device);
        let written = save_classifier(&model, &dir.path().join("classifier.mpk")).unwrap();

        let config = ModelConfig {
            model_file: written,
            ..ModelConfig::default()
        };
        let loaded = load_classifier::<TestBackend>(&config, 3, &device).unwrap();
        assert_eq!(loaded.architecture(), ModelArchitecture::SmallCnn);
    }
}
