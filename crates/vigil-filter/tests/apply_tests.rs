//! Filter application integration tests
//!
//! Property-based checks of the filter algebra over generated record sets.

use std::sync::Arc;

use proptest::prelude::*;
use vigil_data::{count_distinct, Diagnostics, Record, RecordRef};
use vigil_filter::{apply, build_filters, Filter, FilterDefinition, Selection};

fn record_set() -> impl Strategy<Value = Vec<RecordRef>> {
    prop::collection::vec(
        (0u8..20, prop::sample::select(vec!["F", "M"]), prop::sample::select(vec!["A", "B", "C"])),
        0..80,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(id, sex, arm)| {
                Arc::new(
                    Record::new()
                        .with("USUBJID", format!("S{:02}", id))
                        .with("SEX", sex)
                        .with("ARM", arm),
                )
            })
            .collect()
    })
}

fn selection() -> impl Strategy<Value = Selection> {
    prop_oneof![
        Just(Selection::All),
        prop::sample::select(vec!["F", "M", "X"]).prop_map(|s| Selection::One(s.to_string())),
        prop::collection::btree_set(
            prop::sample::select(vec!["A", "B", "C"]).prop_map(str::to_string),
            0..3
        )
        .prop_map(Selection::Many),
    ]
}

fn filters(sex: Selection, arm: Selection) -> Vec<Filter> {
    let mut f_sex = Filter::new("SEX", "Sex", vec!["F".into(), "M".into()]);
    f_sex.selection = sex;
    let mut f_arm = Filter::new("ARM", "Arm", vec!["A".into(), "B".into(), "C".into()]);
    f_arm.multiple = true;
    f_arm.selection = arm;
    vec![f_sex, f_arm]
}

proptest! {
    #[test]
    fn test_apply_is_idempotent(records in record_set(), sex in selection(), arm in selection()) {
        let fs = filters(sex, arm);
        let once = apply(&records, &fs);
        let twice = apply(&once, &fs);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_never_grows_population(records in record_set(), sex in selection(), arm in selection()) {
        let fs = filters(sex, arm);
        let derived = apply(&records, &fs);
        prop_assert!(count_distinct(&derived, "USUBJID") <= count_distinct(&records, "USUBJID"));
        prop_assert!(derived.iter().all(|r| fs.iter().all(|f| f.passes(r))));
    }

    #[test]
    fn test_single_level_filter_never_offered(n in 1usize..30) {
        let records: Vec<RecordRef> = (0..n)
            .map(|i| Arc::new(Record::new().with("USUBJID", format!("{}", i)).with("SITE", "001")))
            .collect();
        let mut diagnostics = Diagnostics::new();
        let live = build_filters(&[FilterDefinition::new("SITE", "Site")], &records, &mut diagnostics);

        prop_assert!(live.is_empty());
        prop_assert_eq!(diagnostics.warnings().count(), 1);
    }
}

#[test]
fn test_all_selection_is_identity() {
    let records: Vec<RecordRef> = vec![
        Arc::new(Record::new().with("SEX", "F")),
        Arc::new(Record::new().with("SEX", "M")),
    ];
    let out = apply(&records, &filters(Selection::All, Selection::All));
    assert_eq!(out, records);
}
