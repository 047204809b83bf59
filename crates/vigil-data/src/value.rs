//! Scalar cell values
//!
//! Long-format safety data arrives with every column as either a JSON string,
//! a JSON number or null. Lab results exported as text ("5.2") are still
//! treated as numbers when they look like plain decimals.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    /// Plain signed decimals, no exponent and no thousands separators
    static ref DECIMAL: Regex = Regex::new(r"^-?(\d+\.?\d*|\.\d+)$").unwrap();
}

/// Default tokens treated as missing in text cells
pub const DEFAULT_MISSING_VALUES: [&str; 3] = ["", "NA", "N/A"];

/// A single cell of a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Missing,
}

impl Value {
    /// Numeric reading of the cell, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if n.is_finite() => Some(*n),
            Value::Text(s) => parse_decimal(s),
            _ => None,
        }
    }

    /// Whether the cell has a numeric reading
    pub fn is_numeric(&self) -> bool {
        self.as_number().is_some()
    }

    /// Whether the cell is null, non-finite, or one of the missing tokens
    pub fn is_missing(&self, missing_values: &[String]) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(n) => !n.is_finite(),
            Value::Text(s) => missing_values.iter().any(|m| m == s),
            Value::Bool(_) => false,
        }
    }

    /// Text form used for grouping, filtering and display
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Missing
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Parse a plain decimal string, ignoring surrounding whitespace
pub fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if !DECIMAL.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// The default missing-value tokens as owned strings
pub fn default_missing_values() -> Vec<String> {
    DEFAULT_MISSING_VALUES.iter().map(|s| s.to_string()).collect()
}
