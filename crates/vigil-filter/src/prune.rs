//! Dead-control elimination
//!
//! A subsetter is only offered when it can actually split the data: its
//! column must exist and hold at least two distinct levels after cleaning.

use vigil_data::{sorted_distinct_values, DiagnosticKind, Diagnostics, RecordRef};

use crate::filter::{Filter, FilterDefinition, Selection};

/// Build live filters from definitions, dropping the ones that cannot split the data
///
/// Every dropped definition leaves a warning in `diagnostics`. Start
/// selections naming levels the data does not have are narrowed to the
/// levels that exist.
pub fn build_filters(
    definitions: &[FilterDefinition],
    records: &[RecordRef],
    diagnostics: &mut Diagnostics,
) -> Vec<Filter> {
    let mut filters = Vec::with_capacity(definitions.len());

    for def in definitions {
        if !records.iter().any(|r| r.has_column(&def.value_col)) {
            diagnostics.push(DiagnosticKind::FilterColumnMissing {
                column: def.value_col.clone(),
                label: def.label.clone(),
            });
            continue;
        }

        let levels = sorted_distinct_values(records, &def.value_col);
        if levels.len() < 2 {
            diagnostics.push(DiagnosticKind::FilterSingleLevel {
                column: def.value_col.clone(),
                label: def.label.clone(),
            });
            continue;
        }

        let start: Vec<&String> = def.start.iter().filter(|s| levels.contains(*s)).collect();
        let selection = if def.multiple || start.len() <= 1 {
            Selection::from_levels(start.into_iter().cloned())
        } else {
            Selection::One(start[0].clone())
        };

        filters.push(Filter {
            column: def.value_col.clone(),
            label: def.label.clone(),
            levels,
            multiple: def.multiple,
            selection,
        });
    }

    filters
}
