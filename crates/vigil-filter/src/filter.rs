//! Subsetter filters
//!
//! A filter restricts the record set to rows whose value in one column
//! matches the current selection. Filters are built from configured
//! [`FilterDefinition`]s once the data is known, so each one carries the
//! levels it offers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use vigil_data::Record;

/// Current value of a subsetter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "values")]
pub enum Selection {
    /// No restriction
    #[default]
    All,
    /// Exactly one level
    One(String),
    /// Any of a set of levels; an empty set passes nothing
    Many(BTreeSet<String>),
}

impl Selection {
    /// Build a selection from a list of levels
    ///
    /// An empty list means "All"; one level becomes [`Selection::One`].
    pub fn from_levels<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: BTreeSet<String> = levels.into_iter().map(Into::into).collect();
        match set.len() {
            0 => Selection::All,
            1 => set.pop_first().map(Selection::One).unwrap_or_default(),
            _ => Selection::Many(set),
        }
    }

    /// Whether a cell value passes
    pub fn passes(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::One(level) => level == value,
            Selection::Many(levels) => levels.contains(value),
        }
    }

    /// Whether this selection restricts anything
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// Levels named by the selection
    pub fn levels(&self) -> Vec<&str> {
        match self {
            Selection::All => Vec::new(),
            Selection::One(level) => vec![level.as_str()],
            Selection::Many(levels) => levels.iter().map(String::as_str).collect(),
        }
    }
}

/// A configured subsetter, before it is checked against the data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    /// Column the filter reads
    pub value_col: String,

    /// Label shown on the control
    pub label: String,

    /// Whether several levels may be selected at once
    #[serde(default)]
    pub multiple: bool,

    /// Initial selection; empty means "All"
    #[serde(default)]
    pub start: Vec<String>,
}

impl FilterDefinition {
    /// Create a single-select filter definition
    pub fn new(value_col: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value_col: value_col.into(),
            label: label.into(),
            multiple: false,
            start: Vec::new(),
        }
    }

    /// Allow several levels at once
    pub fn with_multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Set the initial selection
    pub fn with_start<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.start = levels.into_iter().map(Into::into).collect();
        self
    }
}

/// A live subsetter with the levels it offers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Column the filter reads
    pub column: String,

    /// Label shown on the control
    pub label: String,

    /// Levels present in the cleaned data, sorted
    pub levels: Vec<String>,

    /// Whether several levels may be selected at once
    pub multiple: bool,

    /// Current selection
    pub selection: Selection,
}

impl Filter {
    /// Create a filter offering the given levels, selecting "All"
    pub fn new(column: impl Into<String>, label: impl Into<String>, levels: Vec<String>) -> Self {
        Self {
            column: column.into(),
            label: label.into(),
            levels,
            multiple: false,
            selection: Selection::All,
        }
    }

    /// Whether a record passes this filter
    pub fn passes(&self, record: &Record) -> bool {
        match &self.selection {
            Selection::All => true,
            selection => selection.passes(&record.text(&self.column)),
        }
    }

    /// Whether this filter currently restricts anything
    pub fn is_active(&self) -> bool {
        !self.selection.is_all()
    }
}
