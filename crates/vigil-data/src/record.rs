//! Records and the loaded dataset
//!
//! A [`Dataset`] is built once per chart and never mutated. Derived views
//! hold [`RecordRef`] handles into it, so filtering copies pointers only.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::error::{DataError, DataResult};
use crate::value::Value;

/// Shared handle to an immutable record
pub type RecordRef = Arc<Record>;

/// One row of long-format input data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder style
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Set a field
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Raw cell for a column
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Text form of a cell; absent columns read as empty
    pub fn text(&self, column: &str) -> String {
        self.fields.get(column).map(Value::as_key).unwrap_or_default()
    }

    /// Numeric reading of a cell
    pub fn number(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(Value::as_number)
    }

    /// Whether the record carries the column at all
    pub fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Column names in lexical order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// The immutable record set a chart is constructed with
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<RecordRef>,
    columns: BTreeSet<String>,
}

impl Dataset {
    /// Wrap owned records
    pub fn new(records: Vec<Record>) -> Self {
        let columns = records
            .iter()
            .flat_map(|r| r.columns().map(str::to_string))
            .collect();
        Self {
            records: records.into_iter().map(Arc::new).collect(),
            columns,
        }
    }

    /// Parse a JSON array of flat objects
    pub fn from_json(json: &str) -> DataResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(value)
    }

    /// Build from an already parsed JSON value
    pub fn from_json_value(value: serde_json::Value) -> DataResult<Self> {
        let rows = match value {
            serde_json::Value::Array(rows) => rows,
            other => {
                return Err(DataError::NotAnArray {
                    found: json_kind(&other).to_string(),
                })
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            if !row.is_object() {
                return Err(DataError::NotAnObject {
                    index,
                    found: json_kind(&row).to_string(),
                });
            }
            records.push(serde_json::from_value::<Record>(row)?);
        }

        Ok(Self::new(records))
    }

    /// All records in input order
    pub fn records(&self) -> &[RecordRef] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether any record carries the column
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    /// Union of column names across records
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Distinct non-empty values of a column, in first-seen order
pub fn distinct_values(records: &[RecordRef], column: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for record in records {
        let key = record.text(column);
        if !key.is_empty() && seen.insert(key.clone()) {
            out.push(key);
        }
    }
    out
}

/// Distinct non-empty values of a column, sorted
pub fn sorted_distinct_values(records: &[RecordRef], column: &str) -> Vec<String> {
    let set: BTreeSet<String> = records
        .iter()
        .map(|r| r.text(column))
        .filter(|k| !k.is_empty())
        .collect();
    set.into_iter().collect()
}

/// Number of distinct non-empty values of a column
pub fn count_distinct(records: &[RecordRef], column: &str) -> usize {
    records
        .iter()
        .map(|r| r.text(column))
        .filter(|k| !k.is_empty())
        .collect::<HashSet<_>>()
        .len()
}

/// Numeric readings of a column, skipping cells without one
pub fn numeric_values(records: &[RecordRef], column: &str) -> Vec<f64> {
    records.iter().filter_map(|r| r.number(column)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<RecordRef> {
        vec![
            Arc::new(Record::new().with("USUBJID", "01").with("SEX", "F")),
            Arc::new(Record::new().with("USUBJID", "02").with("SEX", "M")),
            Arc::new(Record::new().with("USUBJID", "01").with("SEX", "F")),
            Arc::new(Record::new().with("USUBJID", Value::Missing)),
        ]
    }

    #[test]
    fn test_distinct_values_first_seen_order() {
        let records = sample();
        assert_eq!(distinct_values(&records, "SEX"), vec!["F", "M"]);
        assert_eq!(count_distinct(&records, "USUBJID"), 2);
        assert_eq!(count_distinct(&records, "ABSENT"), 0);
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"USUBJID": "01", "TEST": "ALT", "STRESN": 30},
            {"USUBJID": "02", "TEST": "ALT", "STRESN": "41.5", "VISIT": "Week 2"}
        ]"#;
        let dataset = Dataset::from_json(json).unwrap();

        assert_eq!(dataset.len(), 2);
        assert!(dataset.has_column("VISIT"));
        assert_eq!(dataset.records()[1].number("STRESN"), Some(41.5));
        assert_eq!(dataset.records()[0].text("STRESN"), "30");
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let err = Dataset::from_json(r#"{"a": 1}"#).unwrap_err();
        assert!(matches!(err, DataError::NotAnArray { .. }));

        let err = Dataset::from_json(r#"[{"a": 1}, 3]"#).unwrap_err();
        assert!(matches!(err, DataError::NotAnObject { index: 1, .. }));
    }
}
