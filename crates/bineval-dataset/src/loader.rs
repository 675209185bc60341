//! Test-set discovery and decoding.
//!
//! Reads the JSON Lines record format and scans class folders of images.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use bineval_core::{validate_labels, Error, ImageDimensions, Result};
use image::imageops::FilterType;
use image::ImageReader;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Image extensions picked up by the folder scanner
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// One line of a records file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleRecord {
    pub label: u8,
    /// Preprocessed pixels in CHW order
    pub pixels: Vec<f32>,
}

/// Read a JSON Lines records file, checking every label and pixel count.
pub fn load_records(path: &Path, dims: ImageDimensions) -> Result<Vec<SampleRecord>> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Records file not found: {}",
            path.display()
        )));
    }

    let expected = dims.total_pixels();
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let record: SampleRecord = serde_json::from_str(&line).map_err(|e| {
            Error::Dataset(format!("{}:{}: {e}", path.display(), line_no + 1))
        })?;

        validate_labels(&[record.label]).map_err(|e| {
            Error::Dataset(format!("{}:{}: {e}", path.display(), line_no + 1))
        })?;
        if record.pixels.len() != expected {
            return Err(Error::Dataset(format!(
                "{}:{}: expected {} pixel values for {}x{}x{}, got {}",
                path.display(),
                line_no + 1,
                expected,
                dims.width,
                dims.height,
                dims.channels,
                record.pixels.len()
            )));
        }

        records.push(record);
    }

    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Map a class directory name to its label.
///
/// Accepts `0`/`1` or one of the configured class names, ignoring case.
pub fn label_for_dir(name: &str, class_names: &[String; 2]) -> Option<u8> {
    match name {
        "0" => Some(0),
        "1" => Some(1),
        _ => class_names
            .iter()
            .position(|class| class.eq_ignore_ascii_case(name))
            .map(|i| i as u8),
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Collect `(path, label)` pairs from a directory of class subdirectories.
///
/// Entries are sorted by class then file name so the order is stable across
/// platforms.
pub fn scan_class_folders(root: &Path, class_names: &[String; 2]) -> Result<Vec<(PathBuf, u8)>> {
    if !root.exists() {
        return Err(Error::NotFound(format!(
            "Directory not found: {}",
            root.display()
        )));
    }
    if !root.is_dir() {
        return Err(Error::Dataset(format!(
            "Path is not a directory: {}",
            root.display()
        )));
    }

    let mut class_dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match label_for_dir(&name, class_names) {
            Some(label) => class_dirs.push((label, path)),
            None => warn!("Skipping unrecognized class directory: {}", path.display()),
        }
    }
    class_dirs.sort();

    let mut samples = Vec::new();
    for (label, dir) in class_dirs {
        let mut images: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image_file(path))
            .collect();
        images.sort();

        debug!("Found {} images for label {} in {}", images.len(), label, dir.display());
        samples.extend(images.into_iter().map(|path| (path, label)));
    }

    Ok(samples)
}

/// Decode, resize and scale an image to `[0, 1]` in CHW order.
pub fn load_image_chw(path: &Path, dims: ImageDimensions) -> Result<Vec<f32>> {
    let img = ImageReader::open(path)?
        .decode()
        .map_err(|e| Error::Image(format!("Failed to decode {}: {e}", path.display())))?
        .resize_exact(dims.width, dims.height, FilterType::Triangle);

    let (width, height) = (dims.width as usize, dims.height as usize);
    let plane = width * height;

    let image = match dims.channels {
        1 => img
            .to_luma8()
            .pixels()
            .map(|p| p[0] as f32 / 255.0)
            .collect(),
        3 => {
            let rgb = img.to_rgb8();
            let mut image = vec![0.0f32; 3 * plane];
            for (x, y, pixel) in rgb.enumerate_pixels() {
                let offset = y as usize * width + x as usize;
                for c in 0..3 {
                    image[c * plane + offset] = pixel[c] as f32 / 255.0;
                }
            }
            image
        }
        other => {
            return Err(Error::Config(format!(
                "Image channels must be 1 or 3, got {other}"
            )))
        }
    };

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names() -> [String; 2] {
        ["normal".to_string(), "abnormal".to_string()]
    }

    fn create_test_image(path: &Path, color: [u8; 3]) {
        let img = image::ImageBuffer::from_fn(10, 8, |_, _| image::Rgb(color));
        img.save(path).unwrap();
    }

    #[test]
    fn test_load_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.jsonl");
        fs::write(
            &path,
            "{\"label\":0,\"pixels\":[0.0,0.5]}\n\n{\"label\":1,\"pixels\":[1.0,0.25]}\n",
        )
        .unwrap();

        let records = load_records(&path, ImageDimensions::new(2, 1, 1)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label, 1);
        assert_eq!(records[1].pixels, vec![1.0, 0.25]);
    }

    #[test]
    fn test_load_records_rejects_bad_label() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.jsonl");
        fs::write(&path, "{\"label\":2,\"pixels\":[0.0,0.5]}\n").unwrap();

        let err = load_records(&path, ImageDimensions::new(2, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::Dataset(_)));
    }

    #[test]
    fn test_load_records_rejects_wrong_length() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.jsonl");
        fs::write(&path, "{\"label\":1,\"pixels\":[0.0]}\n").unwrap();

        let err = load_records(&path, ImageDimensions::new(2, 1, 1)).unwrap_err();
        assert!(err.to_string().contains(":1:"));
    }

    #[test]
    fn test_load_records_missing_file() {
        let err = load_records(Path::new("/nonexistent/test.jsonl"), ImageDimensions::default());
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_label_for_dir() {
        assert_eq!(label_for_dir("0", &names()), Some(0));
        assert_eq!(label_for_dir("1", &names()), Some(1));
        assert_eq!(label_for_dir("Abnormal", &names()), Some(1));
        assert_eq!(label_for_dir("NORMAL", &names()), Some(0));
        assert_eq!(label_for_dir("other", &names()), None);
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b.PNG")));
        assert!(is_image_file(Path::new("scan.jpeg")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("noext")));
    }

    #[test]
    fn test_scan_class_folders() {
        let dir = TempDir::new().unwrap();
        let normal = dir.path().join("Normal");
        let abnormal = dir.path().join("1");
        let ignored = dir.path().join("unknown");
        for d in [&normal, &abnormal, &ignored] {
            fs::create_dir_all(d).unwrap();
        }
        create_test_image(&normal.join("b.png"), [0, 0, 0]);
        create_test_image(&normal.join("a.png"), [0, 0, 0]);
        create_test_image(&abnormal.join("c.png"), [255, 255, 255]);
        create_test_image(&ignored.join("d.png"), [255, 255, 255]);
        fs::write(normal.join("readme.txt"), "skip").unwrap();

        let samples = scan_class_folders(dir.path(), &names()).unwrap();
        let labels: Vec<u8> = samples.iter().map(|(_, l)| *l).collect();
        assert_eq!(labels, vec![0, 0, 1]);
        assert!(samples[0].0.ends_with("a.png"));
    }

    #[test]
    fn test_load_image_chw() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("red.png");
        create_test_image(&path, [255, 0, 0]);

        let rgb = load_image_chw(&path, ImageDimensions::new(4, 4, 3)).unwrap();
        assert_eq!(rgb.len(), 48);
        assert!(rgb[..16].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(rgb[16..].iter().all(|&v| v.abs() < 1e-6));

        let gray = load_image_chw(&path, ImageDimensions::new(4, 4, 1)).unwrap();
        assert_eq!(gray.len(), 16);
        assert!(gray.iter().all(|&v| v > 0.0 && v < 1.0));
    }
}
