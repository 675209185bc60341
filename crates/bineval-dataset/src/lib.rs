//! Test-set loading and batching for binary classifier evaluation.
//!
//! Supports JSON Lines records of preprocessed pixels and class-folder image
//! directories, exposed through Burn's `Dataset` and `Batcher` traits.

pub mod batcher;
pub mod dataset;
pub mod loader;

pub use batcher::{EvalBatch, EvalBatcher};
pub use dataset::{EvalDataset, EvalItem};
pub use loader::{load_records, scan_class_folders, SampleRecord};

pub mod prelude {
    pub use crate::batcher::*;
    pub use crate::dataset::*;
    pub use crate::loader::*;
}
