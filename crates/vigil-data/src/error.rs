//! Error types for vigil-data

use thiserror::Error;

/// Errors raised while loading records
#[derive(Error, Debug)]
pub enum DataError {
    /// Malformed JSON input
    #[error("Failed to parse dataset JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level value is not an array
    #[error("Expected an array of records, got {found}")]
    NotAnArray { found: String },

    /// An element of the array is not an object
    #[error("Record {index} is not an object (got {found})")]
    NotAnObject { index: usize, found: String },
}

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;
