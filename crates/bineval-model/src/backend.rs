//! Backend selection for inference.
//!
//! Evaluation runs on the CPU ndarray backend; nothing here needs gradients.

use burn::tensor::backend::Backend;
use burn_ndarray::{NdArray, NdArrayDevice};

/// The backend used by the evaluation tool
pub type DefaultBackend = NdArray<f32>;

/// Get the default device
pub fn default_device() -> <DefaultBackend as Backend>::Device {
    NdArrayDevice::Cpu
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    "NdArray (CPU)"
}

/// Seed the backend RNG so weight initialization is reproducible
pub fn seed_backend(seed: u64) {
    DefaultBackend::seed(seed);
}
