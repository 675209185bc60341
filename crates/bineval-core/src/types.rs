//! Core type definitions shared across the evaluation crates.

use serde::{Deserialize, Serialize};

/// Network architecture used by the pre-trained classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelArchitecture {
    /// Three conv blocks and a small dense head
    #[default]
    SmallCnn,
    /// AlexNet-style five-conv feature extractor
    #[serde(rename = "alexnet")]
    AlexNet,
}

impl std::fmt::Display for ModelArchitecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelArchitecture::SmallCnn => write!(f, "small_cnn"),
            ModelArchitecture::AlexNet => write!(f, "alexnet"),
        }
    }
}

/// On-disk layout of the test set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatasetFormat {
    /// JSON Lines file of preprocessed `{label, pixels}` records
    #[default]
    Records,
    /// Directory with one image subdirectory per class
    Folder,
}

impl std::fmt::Display for DatasetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetFormat::Records => write!(f, "records"),
            DatasetFormat::Folder => write!(f, "folder"),
        }
    }
}

/// Image dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of channels (1 for grayscale, 3 for RGB)
    pub channels: u32,
}

impl ImageDimensions {
    /// Creates new image dimensions
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    /// Total number of values in one CHW sample
    pub fn total_pixels(&self) -> usize {
        self.width as usize * self.height as usize * self.channels as usize
    }
}

impl Default for ImageDimensions {
    fn default() -> Self {
        Self::new(64, 64, 3)
    }
}

/// Per-channel normalization applied to batches before the forward pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelStats {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_architecture_display() {
        assert_eq!(ModelArchitecture::SmallCnn.to_string(), "small_cnn");
        assert_eq!(ModelArchitecture::AlexNet.to_string(), "alexnet");
    }

    #[test]
    fn test_dataset_format_serde_names() {
        let json = serde_json::to_string(&DatasetFormat::Folder).unwrap();
        assert_eq!(json, "\"folder\"");
        let parsed: ModelArchitecture = serde_json::from_str("\"alexnet\"").unwrap();
        assert_eq!(parsed, ModelArchitecture::AlexNet);
    }

    #[test]
    fn test_architecture_serde_matches_display() {
        for arch in [ModelArchitecture::SmallCnn, ModelArchitecture::AlexNet] {
            let json = serde_json::to_string(&arch).unwrap();
            assert_eq!(json, format!("\"{arch}\""));
        }
        assert!(serde_json::from_str::<ModelArchitecture>("\"alex_net\"").is_err());
    }

    #[test]
    fn test_image_dimensions() {
        let dims = ImageDimensions::new(32, 16, 1);
        assert_eq!(dims.total_pixels(), 32 * 16);
        assert_eq!(ImageDimensions::default().total_pixels(), 64 * 64 * 3);
    }
}
