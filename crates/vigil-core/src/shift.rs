//! Shift plot points
//!
//! Each participant contributes one point: a statistic of their values over
//! the baseline visits against the same statistic over the comparison visits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use vigil_data::RecordRef;

use crate::config::{ColumnRoles, ShiftStat};

/// One participant's baseline and comparison summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftPoint {
    pub participant: String,
    pub baseline: f64,
    pub comparison: f64,
    /// `comparison - baseline`
    pub change: f64,
    /// Change as a percentage of baseline; undefined for a zero baseline
    pub percent_change: Option<f64>,
    /// First record of the participant, for detail columns
    #[serde(skip)]
    pub record: Option<RecordRef>,
}

/// Which visits feed each side of the plot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShiftVisits {
    pub baseline: Vec<String>,
    pub comparison: Vec<String>,
}

impl ShiftVisits {
    /// Configured sets, defaulting to the first visit against all later ones
    pub fn resolve(baseline: &[String], comparison: &[String], visits: &[String]) -> Self {
        let baseline = if baseline.is_empty() {
            visits.iter().take(1).cloned().collect()
        } else {
            baseline.to_vec()
        };
        let comparison = if comparison.is_empty() {
            visits.iter().skip(1).cloned().collect()
        } else {
            comparison.to_vec()
        };
        Self {
            baseline,
            comparison,
        }
    }
}

/// Summary statistics applied to each side
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShiftStats {
    pub baseline: ShiftStat,
    pub comparison: ShiftStat,
}

/// Build one point per participant with values on both sides
///
/// Records are expected to hold a single measure. Participants without a
/// baseline or a comparison value are left out.
pub fn shift_points(
    records: &[RecordRef],
    columns: &ColumnRoles,
    visit_col: &str,
    visits: &ShiftVisits,
    stats: ShiftStats,
) -> Vec<ShiftPoint> {
    struct Sides {
        record: RecordRef,
        baseline: Vec<f64>,
        comparison: Vec<f64>,
    }

    let mut order: Vec<String> = Vec::new();
    let mut by_participant: HashMap<String, Sides> = HashMap::new();

    for record in records {
        let Some(value) = record.number(&columns.value_col) else {
            continue;
        };
        let id = record.text(&columns.id_col);
        let visit = record.text(visit_col);
        let sides = by_participant.entry(id.clone()).or_insert_with(|| {
            order.push(id);
            Sides {
                record: record.clone(),
                baseline: Vec::new(),
                comparison: Vec::new(),
            }
        });
        if visits.baseline.contains(&visit) {
            sides.baseline.push(value);
        }
        if visits.comparison.contains(&visit) {
            sides.comparison.push(value);
        }
    }

    order
        .into_iter()
        .filter_map(|id| {
            let sides = by_participant.remove(&id)?;
            let baseline = stats.baseline.apply(&sides.baseline)?;
            let comparison = stats.comparison.apply(&sides.comparison)?;
            let change = comparison - baseline;
            Some(ShiftPoint {
                participant: id,
                baseline,
                comparison,
                change,
                percent_change: (baseline != 0.0).then(|| change / baseline * 100.0),
                record: Some(sides.record),
            })
        })
        .collect()
}
