//! Column typing inferred from loaded records

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::record::RecordRef;

/// Schema describing the columns of a record set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSchema {
    /// Column descriptors in lexical order
    pub columns: Vec<ColumnDescriptor>,

    /// Number of records
    pub num_records: usize,
}

impl DataSchema {
    /// Infer column types and level counts
    ///
    /// A column is numeric when every non-missing cell has a numeric reading.
    pub fn infer(records: &[RecordRef], missing_values: &[String]) -> Self {
        let mut builders: BTreeMap<String, ColumnBuilder> = BTreeMap::new();

        for record in records {
            for column in record.columns() {
                let builder = builders
                    .entry(column.to_string())
                    .or_insert_with(ColumnBuilder::new);
                let Some(value) = record.get(column) else {
                    continue;
                };
                if value.is_missing(missing_values) {
                    builder.missing += 1;
                    continue;
                }
                if !value.is_numeric() {
                    builder.all_numeric = false;
                }
                builder.levels.insert(value.as_key());
            }
        }

        let columns = builders
            .into_iter()
            .map(|(name, b)| ColumnDescriptor {
                dtype: if b.levels.is_empty() {
                    ColumnType::Empty
                } else if b.all_numeric {
                    ColumnType::Numeric
                } else {
                    ColumnType::Categorical
                },
                distinct_count: b.levels.len(),
                missing_count: b.missing,
                name,
            })
            .collect();

        Self {
            columns,
            num_records: records.len(),
        }
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

struct ColumnBuilder {
    levels: HashSet<String>,
    missing: usize,
    all_numeric: bool,
}

impl ColumnBuilder {
    fn new() -> Self {
        Self {
            levels: HashSet::new(),
            missing: 0,
            all_numeric: true,
        }
    }
}

/// Descriptor for a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,

    /// Inferred type
    pub dtype: ColumnType,

    /// Number of distinct non-missing values
    pub distinct_count: usize,

    /// Number of missing cells
    pub missing_count: usize,
}

/// Inferred column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
    /// Every cell is missing
    Empty,
}

impl ColumnType {
    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Numeric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::value::{default_missing_values, Value};
    use std::sync::Arc;

    #[test]
    fn test_infer_types() {
        let records: Vec<RecordRef> = vec![
            Arc::new(Record::new().with("AGE", 54.0).with("SEX", "F").with("NOTE", "NA")),
            Arc::new(Record::new().with("AGE", "61").with("SEX", "M").with("NOTE", Value::Missing)),
            Arc::new(Record::new().with("AGE", "").with("SEX", "F")),
        ];
        let schema = DataSchema::infer(&records, &default_missing_values());

        let age = schema.column("AGE").unwrap();
        assert_eq!(age.dtype, ColumnType::Numeric);
        assert_eq!(age.distinct_count, 2);
        assert_eq!(age.missing_count, 1);

        let sex = schema.column("SEX").unwrap();
        assert_eq!(sex.dtype, ColumnType::Categorical);
        assert_eq!(sex.distinct_count, 2);

        assert_eq!(schema.column("NOTE").unwrap().dtype, ColumnType::Empty);
        assert_eq!(schema.num_records, 3);
    }
}
