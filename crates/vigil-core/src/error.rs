//! Error types for vigil-core
//!
//! Errors cover host-interface faults only:
//! - Malformed input JSON
//! - Settings that fail validation
//! - Control events naming something the chart does not offer
//!
//! Data-quality problems go to the diagnostics channel instead.

use thiserror::Error;
use vigil_data::DataError;
use vigil_filter::FilterError;

/// Main error type for chart operations
#[derive(Error, Debug)]
pub enum VigilError {
    /// Dataset loading errors
    #[error("Failed to load dataset: {0}")]
    Data(#[from] DataError),

    /// Settings rejected by validation
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Subsetter event rejected by the filter store
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Measure picker set to a measure the data does not offer
    #[error("Measure '{0}' is not a numeric measure in the data")]
    UnknownMeasure(String),

    /// Group picker set to an unconfigured grouping
    #[error("Grouping '{0}' is not configured")]
    UnknownGroup(String),

    /// Time axis set to an unconfigured column
    #[error("Time column '{0}' is not configured")]
    UnknownTimeColumn(String),

    /// Selection criterion not meaningful for this chart kind
    #[error("Selection not supported here: {0}")]
    UnsupportedSelection(String),

    /// Settings or session JSON failed to parse
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by [`crate::config::ChartSettings::validate`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A value is outside its valid range
    #[error("{0}")]
    OutOfRange(String),

    /// A required column role is empty
    #[error("Missing required setting: {0}")]
    MissingField(String),

    /// The unscheduled-visit pattern does not compile
    #[error("Invalid unscheduled visit pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Result type for chart operations
pub type VigilResult<T> = Result<T, VigilError>;

/// Result type for settings validation
pub type ConfigResult<T> = Result<T, ConfigError>;
