//! Burn dataset over the evaluation test set.

use std::path::PathBuf;

use bineval_core::{DatasetConfig, DatasetFormat, Error, ImageDimensions, Result};
use burn::data::dataset::Dataset;
use tracing::info;

use crate::loader::{load_image_chw, load_records, scan_class_folders};

/// A single test sample ready for batching
#[derive(Clone, Debug, PartialEq)]
pub struct EvalItem {
    /// Flattened CHW image in `[0, 1]`
    pub image: Vec<f32>,
    /// Ground truth, 0 or 1
    pub label: u8,
}

#[derive(Debug, Clone)]
enum Samples {
    /// Decoded records held in memory
    Inline(Vec<EvalItem>),
    /// Image files decoded on demand
    Files(Vec<(PathBuf, u8)>),
}

/// Ordered test set; item `i` is always the same sample.
#[derive(Debug, Clone)]
pub struct EvalDataset {
    samples: Samples,
    dims: ImageDimensions,
}

impl EvalDataset {
    /// Open the test set described by the dataset configuration
    pub fn open(config: &DatasetConfig, class_names: &[String; 2]) -> Result<Self> {
        let path = config.test_path();
        let dims = config.image_size;

        let dataset = match config.format {
            DatasetFormat::Records => {
                let items = load_records(&path, dims)?
                    .into_iter()
                    .map(|r| EvalItem {
                        image: r.pixels,
                        label: r.label,
                    })
                    .collect();
                Self::from_items(items, dims)
            }
            DatasetFormat::Folder => Self::from_files(scan_class_folders(&path, class_names)?, dims),
        };

        info!(
            "Loaded {} test samples ({}) from {}",
            dataset.len(),
            config.format,
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_items(items: Vec<EvalItem>, dims: ImageDimensions) -> Self {
        Self {
            samples: Samples::Inline(items),
            dims,
        }
    }

    pub fn from_files(files: Vec<(PathBuf, u8)>, dims: ImageDimensions) -> Self {
        Self {
            samples: Samples::Files(files),
            dims,
        }
    }

    pub fn dims(&self) -> ImageDimensions {
        self.dims
    }

    pub fn len(&self) -> usize {
        match &self.samples {
            Samples::Inline(items) => items.len(),
            Samples::Files(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels in dataset order
    pub fn labels(&self) -> Vec<u8> {
        match &self.samples {
            Samples::Inline(items) => items.iter().map(|i| i.label).collect(),
            Samples::Files(files) => files.iter().map(|(_, l)| *l).collect(),
        }
    }

    /// Sample counts for label 0 and label 1
    pub fn class_counts(&self) -> [usize; 2] {
        let mut counts = [0usize; 2];
        for label in self.labels() {
            if let Some(count) = counts.get_mut(label as usize) {
                *count += 1;
            }
        }
        counts
    }

    /// Load one item, reporting decode failures instead of hiding them.
    pub fn load_item(&self, index: usize) -> Result<EvalItem> {
        let out_of_range = || {
            Error::Dataset(format!(
                "Index {index} out of range for dataset of {} samples",
                self.len()
            ))
        };

        let item = match &self.samples {
            Samples::Inline(items) => items.get(index).cloned().ok_or_else(out_of_range)?,
            Samples::Files(files) => {
                let (path, label) = files.get(index).ok_or_else(out_of_range)?;
                EvalItem {
                    image: load_image_chw(path, self.dims)?,
                    label: *label,
                }
            }
        };

        let expected = self.dims.total_pixels();
        if item.image.len() != expected {
            return Err(Error::Dataset(format!(
                "Sample {index} has {} values, expected {expected} for {}x{}x{}",
                item.image.len(),
                self.dims.channels,
                self.dims.height,
                self.dims.width
            )));
        }

        Ok(item)
    }
}

impl Dataset<EvalItem> for EvalDataset {
    fn get(&self, index: usize) -> Option<EvalItem> {
        self.load_item(index).ok()
    }

    fn len(&self) -> usize {
        EvalDataset::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn items() -> Vec<EvalItem> {
        vec![
            EvalItem { image: vec![0.0; 4], label: 0 },
            EvalItem { image: vec![1.0; 4], label: 1 },
            EvalItem { image: vec![0.5; 4], label: 1 },
        ]
    }

    #[test]
    fn test_inline_dataset() {
        let dataset = EvalDataset::from_items(items(), ImageDimensions::new(2, 2, 1));
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.labels(), vec![0, 1, 1]);
        assert_eq!(dataset.class_counts(), [1, 2]);
        assert_eq!(dataset.load_item(2).unwrap().image, vec![0.5; 4]);
        assert!(Dataset::get(&dataset, 3).is_none());
        assert!(matches!(dataset.load_item(3), Err(Error::Dataset(_))));
    }

    #[test]
    fn test_wrong_pixel_count_is_an_error() {
        let mut samples = items();
        samples[1].image.truncate(3);
        let dataset = EvalDataset::from_items(samples, ImageDimensions::new(2, 2, 1));

        assert!(dataset.load_item(0).is_ok());
        assert!(matches!(dataset.load_item(1), Err(Error::Dataset(_))));
        assert!(Dataset::get(&dataset, 1).is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dataset = EvalDataset::from_files(
            vec![(PathBuf::from("/nonexistent/a.png"), 0)],
            ImageDimensions::new(2, 2, 3),
        );
        assert!(dataset.load_item(0).is_err());
    }

    #[test]
    fn test_open_records() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("test.jsonl"),
            "{\"label\":1,\"pixels\":[0.1,0.2]}\n{\"label\":0,\"pixels\":[0.3,0.4]}\n",
        )
        .unwrap();

        let config = DatasetConfig {
            dataset_folder: dir.path().to_path_buf(),
            image_size: ImageDimensions::new(1, 2, 1),
            ..DatasetConfig::default()
        };
        let names = ["normal".to_string(), "abnormal".to_string()];

        let dataset = EvalDataset::open(&config, &names).unwrap();
        assert_eq!(dataset.labels(), vec![1, 0]);
        assert_eq!(dataset.load_item(1).unwrap().image, vec![0.3, 0.4]);
    }

    #[test]
    fn test_open_folder() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("test");
        for (class, color) in [("0", 0u8), ("1", 255u8)] {
            let class_dir = root.join(class);
            fs::create_dir_all(&class_dir).unwrap();
            let img = image::ImageBuffer::from_fn(6, 6, |_, _| image::Rgb([color; 3]));
            img.save(class_dir.join("img.png")).unwrap();
        }

        let config = DatasetConfig {
            dataset_folder: dir.path().to_path_buf(),
            test_file: PathBuf::from("test"),
            format: DatasetFormat::Folder,
            image_size: ImageDimensions::new(3, 3, 3),
            ..DatasetConfig::default()
        };
        let names = ["normal".to_string(), "abnormal".to_string()];

        let dataset = EvalDataset::open(&config, &names).unwrap();
        assert_eq!(dataset.labels(), vec![0, 1]);
        let white = dataset.load_item(1).unwrap();
        assert_eq!(white.image.len(), 27);
        assert!(white.image.iter().all(|&v| (v - 1.0).abs() < 1e-6));
    }
}
