//! Classifier architectures, weight loading and inference.
//!
//! This crate provides:
//! - `small_cnn` and `alexnet` single-logit classifiers
//! - CompactRecorder weight loading and saving
//! - Batched probability collection over the test set
//! - The `Evaluator` tying inference to threshold selection and charts

pub mod backend;
pub mod evaluator;
pub mod model;
pub mod runner;
pub mod weights;

pub use backend::{backend_name, default_device, seed_backend, DefaultBackend};
pub use evaluator::Evaluator;
pub use model::{AlexNet, BinaryClassifier, ClassifierConfig, ConvBlock, SmallCnn};
pub use runner::{InferenceOutput, InferenceRunner, ProbabilityModel};
pub use weights::{load_classifier, save_classifier, weights_path};

pub mod prelude {
    pub use super::evaluator::Evaluator;
    pub use super::model::{BinaryClassifier, ClassifierConfig};
    pub use super::runner::{InferenceOutput, InferenceRunner, ProbabilityModel};
    pub use super::weights::{load_classifier, save_classifier};
}
