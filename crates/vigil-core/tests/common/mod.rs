//! Shared fixtures for vigil-core integration tests

#![allow(dead_code)]

use vigil_core::{Chart, ChartKind, ChartSettings, GroupDefinition, RecordingAdapter};
use vigil_data::{Dataset, Record};
use vigil_filter::FilterDefinition;

pub const VISITS: [(&str, f64); 4] = [
    ("Screening", 1.0),
    ("Week 2", 2.0),
    ("Week 4", 3.0),
    ("Unscheduled 1", 3.5),
];

/// Four participants, two arms, ALT and AST at every visit
///
/// ALT for participant `n` at visit `v` is `10n + 2v`, with a normal range of
/// 0..40. AST is `n + v` with a normal range of 0..10.
pub fn lab_dataset() -> Dataset {
    let participants = [("01", "F", "Placebo"), ("02", "M", "Placebo"), ("03", "F", "Drug"), ("04", "M", "Drug")];
    let mut records = Vec::new();
    for (n, (id, sex, arm)) in participants.iter().enumerate() {
        let n = (n + 1) as f64;
        for (v, (visit, visitnum)) in VISITS.iter().enumerate() {
            let v = v as f64;
            for (test, value, high) in [("ALT", 10.0 * n + 2.0 * v, 40.0), ("AST", n + v, 10.0)] {
                records.push(
                    Record::new()
                        .with("USUBJID", *id)
                        .with("SEX", *sex)
                        .with("ARM", *arm)
                        .with("TEST", test)
                        .with("STRESN", value)
                        .with("STRESU", "U/L")
                        .with("STNRLO", 0.0)
                        .with("STNRHI", high)
                        .with("VISIT", *visit)
                        .with("VISITNUM", *visitnum)
                        .with("DY", 14.0 * v + 1.0),
                );
            }
        }
    }
    Dataset::new(records)
}

pub fn settings(chart: ChartKind) -> ChartSettings {
    ChartSettings {
        filters: vec![
            FilterDefinition::new("SEX", "Sex"),
            FilterDefinition::new("ARM", "Arm").with_multiple(),
        ],
        groups: vec![GroupDefinition::new("ARM", "Arm")],
        ..ChartSettings::for_chart(chart)
    }
}

pub fn chart(kind: ChartKind) -> Chart<RecordingAdapter> {
    Chart::new(&lab_dataset(), &settings(kind), RecordingAdapter::new())
        .expect("fixture settings are valid")
}
