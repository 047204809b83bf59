//! Filter evaluation
//!
//! Evaluates the active filters against a record set, producing either a
//! selection mask or the passing records themselves. A record passes only if
//! it passes every filter.

use vigil_data::RecordRef;

use crate::filter::{Filter, Selection};

/// Context for evaluation - provides cell values by row
pub trait FilterContext {
    /// Text form of a cell; absent cells read as empty
    fn cell(&self, column: &str, index: usize) -> String;

    /// Number of rows
    fn num_records(&self) -> usize;
}

impl FilterContext for [RecordRef] {
    fn cell(&self, column: &str, index: usize) -> String {
        self.get(index).map(|r| r.text(column)).unwrap_or_default()
    }

    fn num_records(&self) -> usize {
        self.len()
    }
}

/// Evaluator for filter sets
pub struct Evaluator<'a, C: FilterContext + ?Sized> {
    context: &'a C,
}

impl<'a, C: FilterContext + ?Sized> Evaluator<'a, C> {
    /// Create a new evaluator
    pub fn new(context: &'a C) -> Self {
        Self { context }
    }

    /// Evaluate filters, returning a selection mask
    pub fn evaluate(&self, filters: &[Filter]) -> Vec<bool> {
        let active: Vec<&Filter> = filters.iter().filter(|f| f.is_active()).collect();
        (0..self.context.num_records())
            .map(|i| self.evaluate_at(&active, i))
            .collect()
    }

    /// Evaluate active filters at a single row
    fn evaluate_at(&self, active: &[&Filter], index: usize) -> bool {
        active.iter().all(|f| match &f.selection {
            Selection::All => true,
            selection => selection.passes(&self.context.cell(&f.column, index)),
        })
    }
}

/// Records passing every filter, in input order
///
/// Pure and idempotent: applying the same filters to the output returns it
/// unchanged.
pub fn apply(records: &[RecordRef], filters: &[Filter]) -> Vec<RecordRef> {
    let mask = Evaluator::new(records).evaluate(filters);
    records
        .iter()
        .zip(mask)
        .filter_map(|(r, keep)| keep.then(|| r.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vigil_data::Record;

    fn records() -> Vec<RecordRef> {
        [("01", "F", "A"), ("02", "M", "A"), ("03", "F", "B"), ("04", "M", "B")]
            .iter()
            .map(|(id, sex, arm)| {
                Arc::new(
                    Record::new()
                        .with("USUBJID", *id)
                        .with("SEX", *sex)
                        .with("ARM", *arm),
                )
            })
            .collect()
    }

    fn filter(column: &str, selection: Selection) -> Filter {
        let mut f = Filter::new(column, column, Vec::new());
        f.selection = selection;
        f
    }

    #[test]
    fn test_all_passes_everything() {
        let recs = records();
        let out = apply(&recs, &[filter("SEX", Selection::All)]);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let recs = records();
        let filters = [
            filter("SEX", Selection::One("F".into())),
            filter("ARM", Selection::One("B".into())),
        ];
        let out = apply(&recs, &filters);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].text("USUBJID"), "03");
    }

    #[test]
    fn test_multi_select() {
        let recs = records();
        let mask = Evaluator::new(recs.as_slice())
            .evaluate(&[filter("USUBJID", Selection::from_levels(["01", "04"]))]);

        assert_eq!(mask, vec![true, false, false, true]);
    }
}
