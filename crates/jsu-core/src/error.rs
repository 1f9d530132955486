//! Error types for jsu

use thiserror::Error;

/// jsu error type
#[derive(Error, Debug)]
pub enum Error {
    /// Parameters do not share a common floating-point element type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Shapes cannot be broadcast together
    #[error("Incompatible shapes: {0}")]
    IncompatibleShapes(String),

    /// Argument outside its domain (e.g. non-positive `delta` or `scale`)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Computation error (e.g. undefined statistic with `allow_nan_stats = false`)
    #[error("Computation error: {0}")]
    Computation(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
