//! Error types for the core data model.

use thiserror::Error;

/// Errors raised when constructing core data buffers.
#[derive(Error, Debug)]
pub enum DataError {
    /// Image or map dimensions are zero or otherwise unusable.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A pixel or sample buffer does not match the declared dimensions.
    #[error("Buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

/// Result type alias for core data operations.
pub type DataResult<T> = Result<T, DataError>;
