//! Core types, metrics and reporting for binary classifier evaluation.
//!
//! This crate holds everything that does not need a tensor backend: the
//! configuration, the ROC and threshold metrics, chart rendering and the
//! JSON/CSV exports.

pub mod charts;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod report;
pub mod types;

pub use cli::*;
pub use config::*;
pub use error::{Error, Result};
pub use metrics::*;
pub use types::*;

pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::{Error, Result};
    pub use crate::metrics::*;
    pub use crate::types::*;
}
