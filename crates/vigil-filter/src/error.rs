//! Error types for vigil-filter

use thiserror::Error;

/// Errors raised when a control event names something the store does not offer
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("No filter on column '{0}'")]
    UnknownFilter(String),

    #[error("Level '{level}' does not occur in column '{column}'")]
    UnknownLevel { column: String, level: String },

    #[error("Filter on column '{0}' accepts a single level")]
    NotMultiSelect(String),
}

/// Result type for filter store operations
pub type FilterResult<T> = Result<T, FilterError>;
