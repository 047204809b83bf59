//! Measure and visit resolution
//!
//! Runs once at chart initialization:
//! - counts the population before any cleaning
//! - drops rows whose result is missing
//! - classifies measures and drops categorical ones
//! - picks the initial measure
//! - orders visits for ordinal time axes

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use vigil_data::{count_distinct, Dataset, DiagnosticKind, Diagnostics, Record, RecordRef};

use crate::config::{ColumnRoles, GroupDefinition, ResolvedSettings, TimeColumn};

/// Cleaned records and the measures they offer
#[derive(Debug, Clone, Default)]
pub struct ResolvedData {
    /// Rows with a numeric result for a numeric measure
    pub records: Vec<RecordRef>,
    /// Distinct participants in the raw data, before cleaning
    pub population_count: usize,
    /// Numeric measures in data order
    pub measures: Vec<String>,
    /// Measures dropped because a result was not numeric
    pub categorical_measures: Vec<String>,
    /// Measure selected first
    pub initial_measure: Option<String>,
}

impl ResolvedData {
    /// Offered measure matching a name, ignoring surrounding whitespace
    pub fn measure(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.measures.iter().map(String::as_str).find(|m| *m == name)
    }

    /// Whether a measure is offered
    pub fn has_measure(&self, measure: &str) -> bool {
        self.measure(measure).is_some()
    }
}

/// Measure name of a record, trimmed
pub fn measure_name(record: &Record, columns: &ColumnRoles) -> String {
    record.text(&columns.measure_col).trim().to_string()
}

/// Clean the raw data and resolve measures
pub fn resolve_data(
    dataset: &Dataset,
    settings: &ResolvedSettings,
    diagnostics: &mut Diagnostics,
) -> ResolvedData {
    let columns = &settings.columns;
    let population_count = count_distinct(dataset.records(), &columns.id_col);

    let cleaned = clean_records(
        dataset.records(),
        &columns.value_col,
        &settings.missing_values,
        diagnostics,
    );

    let (measures, categorical_measures) = classify_measures(&cleaned, columns);
    if !categorical_measures.is_empty() {
        diagnostics.push(DiagnosticKind::CategoricalMeasuresRemoved {
            measures: categorical_measures.clone(),
        });
    }

    let numeric: HashSet<&str> = measures.iter().map(String::as_str).collect();
    let records: Vec<RecordRef> = cleaned
        .into_iter()
        .filter(|r| numeric.contains(measure_name(r, columns).as_str()))
        .collect();

    let initial_measure = initial_measure(&measures, settings.start_value.as_deref(), diagnostics);

    tracing::info!(
        "resolved {} records, {} measures, {} participants",
        records.len(),
        measures.len(),
        population_count
    );

    ResolvedData {
        records,
        population_count,
        measures,
        categorical_measures,
        initial_measure,
    }
}

/// Drop rows whose result cell is absent or a missing token
pub fn clean_records(
    records: &[RecordRef],
    value_col: &str,
    missing_values: &[String],
    diagnostics: &mut Diagnostics,
) -> Vec<RecordRef> {
    let kept: Vec<RecordRef> = records
        .iter()
        .filter(|r| {
            r.get(value_col)
                .map(|v| !v.is_missing(missing_values))
                .unwrap_or(false)
        })
        .cloned()
        .collect();

    let removed = records.len() - kept.len();
    if removed > 0 {
        diagnostics.push(DiagnosticKind::MissingValuesRemoved { count: removed });
    }
    kept
}

/// Split measures into numeric and categorical, each in first-seen order
///
/// A measure is numeric only if every remaining result parses as a number.
pub fn classify_measures(records: &[RecordRef], columns: &ColumnRoles) -> (Vec<String>, Vec<String>) {
    let mut order: Vec<String> = Vec::new();
    let mut numeric: HashMap<String, bool> = HashMap::new();

    for record in records {
        let name = measure_name(record, columns);
        if name.is_empty() {
            continue;
        }
        let is_numeric = record.number(&columns.value_col).is_some();
        match numeric.get_mut(&name) {
            Some(flag) => *flag &= is_numeric,
            None => {
                numeric.insert(name.clone(), is_numeric);
                order.push(name);
            }
        }
    }

    order
        .into_iter()
        .partition(|m| numeric.get(m).copied().unwrap_or(false))
}

/// Configured start measure when available, else the first numeric measure
pub fn initial_measure(
    measures: &[String],
    start_value: Option<&str>,
    diagnostics: &mut Diagnostics,
) -> Option<String> {
    let first = measures.first().cloned();
    match start_value.map(str::trim) {
        Some(start) if measures.iter().any(|m| m == start) => Some(start.to_string()),
        Some(start) => {
            diagnostics.push(DiagnosticKind::StartValueUnavailable {
                value: start.to_string(),
                fallback: first.clone(),
            });
            first
        }
        None => first,
    }
}

/// Ordered visit labels for an ordinal time column
///
/// With an explicit order, listed visits come first and the remaining
/// observed visits follow in their data-driven order. The data-driven order
/// sorts by the smallest order-column value seen for each label (ties and
/// labels without an order value fall back to natural label order), or by
/// natural label order when there is no order column.
pub fn visit_order(records: &[RecordRef], time: &TimeColumn) -> Vec<String> {
    let mut min_order: HashMap<String, f64> = HashMap::new();
    for record in records {
        let label = record.text(&time.value_col);
        if label.is_empty() {
            continue;
        }
        let order = time
            .order_col
            .as_deref()
            .and_then(|col| record.number(col))
            .unwrap_or(f64::INFINITY);
        min_order
            .entry(label)
            .and_modify(|o| *o = o.min(order))
            .or_insert(order);
    }

    let mut observed: Vec<(String, f64)> = min_order.into_iter().collect();
    observed.sort_by(|(a, oa), (b, ob)| oa.total_cmp(ob).then_with(|| natural_cmp(a, b)));

    let mut ordered: Vec<String> = Vec::new();
    for visit in &time.order {
        if !ordered.contains(visit) {
            ordered.push(visit.clone());
        }
    }
    for (visit, _) in observed {
        if !ordered.contains(&visit) {
            ordered.push(visit);
        }
    }
    ordered
}

/// Groupings whose column exists; the placeholder always survives
pub fn available_groups(
    groups: &[GroupDefinition],
    dataset: &Dataset,
    diagnostics: &mut Diagnostics,
) -> Vec<GroupDefinition> {
    groups
        .iter()
        .filter(|g| {
            if g.is_placeholder() || dataset.has_column(&g.value_col) {
                return true;
            }
            diagnostics.push(DiagnosticKind::GroupColumnMissing {
                column: g.value_col.clone(),
                label: g.label.clone(),
            });
            false
        })
        .cloned()
        .collect()
}

/// Compare labels with embedded numbers by value ("Week 2" < "Week 10")
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();

    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let na = take_digits(&mut ai);
                let nb = take_digits(&mut bi);
                let ta = na.trim_start_matches('0');
                let tb = nb.trim_start_matches('0');
                let ord = ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartSettings;
    use std::sync::Arc;
    use vigil_data::Value;

    fn lab(id: &str, test: &str, value: impl Into<Value>) -> Record {
        Record::new()
            .with("USUBJID", id)
            .with("TEST", test)
            .with("STRESN", value)
    }

    #[test]
    fn test_resolve_drops_missing_and_categorical() {
        let dataset = Dataset::new(vec![
            lab("01", "ALT", 30.0),
            lab("02", "ALT", "NA"),
            lab("03", "ALT", 41.0),
            lab("01", "Color", "Yellow"),
            lab("02", " AST ", "22"),
            lab("04", "AST", Value::Missing),
        ]);
        let settings = ChartSettings::default().resolve().unwrap();
        let mut diagnostics = Diagnostics::new();

        let resolved = resolve_data(&dataset, &settings, &mut diagnostics);

        assert_eq!(resolved.population_count, 4);
        assert_eq!(resolved.measures, vec!["ALT", "AST"]);
        assert_eq!(resolved.categorical_measures, vec!["Color"]);
        assert_eq!(resolved.records.len(), 3);
        assert_eq!(resolved.initial_measure.as_deref(), Some("ALT"));
        assert!(resolved.has_measure("AST "));
        assert_eq!(resolved.measure(" AST "), Some("AST"));

        let kinds: Vec<&DiagnosticKind> = diagnostics.entries().iter().map(|d| &d.kind).collect();
        assert_eq!(kinds[0], &DiagnosticKind::MissingValuesRemoved { count: 2 });
        assert_eq!(
            kinds[1],
            &DiagnosticKind::CategoricalMeasuresRemoved {
                measures: vec!["Color".to_string()]
            }
        );
    }

    #[test]
    fn test_initial_measure_fallback() {
        let measures = vec!["ALT".to_string(), "AST".to_string()];
        let mut diagnostics = Diagnostics::new();

        assert_eq!(
            initial_measure(&measures, Some("AST"), &mut diagnostics).as_deref(),
            Some("AST")
        );
        assert!(diagnostics.is_empty());

        assert_eq!(
            initial_measure(&measures, Some("BILI"), &mut diagnostics).as_deref(),
            Some("ALT")
        );
        assert_eq!(diagnostics.len(), 1);
    }

    fn visits(rows: &[(&str, Option<f64>)]) -> Vec<RecordRef> {
        rows.iter()
            .map(|(visit, order)| {
                Arc::new(
                    Record::new()
                        .with("VISIT", *visit)
                        .with("VISITNUM", order.map(Value::Number).unwrap_or(Value::Missing)),
                )
            })
            .collect()
    }

    #[test]
    fn test_visit_order_by_order_column() {
        let records = visits(&[("C", Some(3.0)), ("A", Some(1.0)), ("B", Some(2.0))]);
        assert_eq!(visit_order(&records, &TimeColumn::default()), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_visit_order_uses_minimum_and_breaks_ties() {
        let records = visits(&[
            ("Week 4", Some(4.0)),
            ("Screening", Some(0.0)),
            ("Unscheduled", Some(4.0)),
            ("Week 4", Some(9.0)),
            ("Baseline", None),
        ]);
        assert_eq!(
            visit_order(&records, &TimeColumn::default()),
            vec!["Screening", "Unscheduled", "Week 4", "Baseline"]
        );
    }

    #[test]
    fn test_visit_order_explicit_then_extras() {
        let records = visits(&[("Week 2", None), ("Week 10", None), ("Baseline", None), ("Week 1", None)]);
        let time = TimeColumn::ordinal("VISIT", "Visit").with_order(["Baseline", "Missing Visit"]);

        assert_eq!(
            visit_order(&records, &time),
            vec!["Baseline", "Missing Visit", "Week 1", "Week 2", "Week 10"]
        );
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("Week 2", "Week 10"), Ordering::Less);
        assert_eq!(natural_cmp("Day 007", "Day 7"), "Day 007".cmp("Day 7"));
        assert_eq!(natural_cmp("b", "a"), Ordering::Greater);
        assert_eq!(natural_cmp("V1", "V1a"), Ordering::Less);
    }

    #[test]
    fn test_available_groups_drops_absent_columns() {
        let dataset = Dataset::new(vec![Record::new().with("ARM", "A")]);
        let groups = vec![
            GroupDefinition::none(),
            GroupDefinition::new("ARM", "Arm"),
            GroupDefinition::new("SITE", "Site"),
        ];
        let mut diagnostics = Diagnostics::new();
        let kept = available_groups(&groups, &dataset, &mut diagnostics);

        assert_eq!(kept.len(), 2);
        assert_eq!(diagnostics.len(), 1);
    }
}
