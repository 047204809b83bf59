//! Linked detail view
//!
//! The detail view is a function of the current selection: a histogram bar,
//! a box, a brushed region or a participant. A new selection replaces the
//! old one; clearing restores the chart's default footnote.

use serde::{Deserialize, Serialize};

use vigil_data::RecordRef;
use vigil_filter::BrushExtent;
use vigil_stats::NormalRange;

use crate::axis::{axis_label, format_number, LinearDomain};
use crate::config::{ChartKind, ColumnRoles, DetailColumn, TimeColumn, TimeScale};
use crate::frame::Position;
use crate::resolver::measure_name;
use crate::shift::ShiftPoint;

/// What the user picked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SelectionCriterion {
    /// A histogram bar
    Bin { index: usize },
    /// One group's box at one visit
    Box { visit: String, group: String },
    /// A rectangle in data coordinates
    Brush { extent: BrushExtent },
    /// A rectangle in plot-area pixels
    ScreenBrush { x: (f32, f32), y: (f32, f32) },
    /// A participant's line or point
    Participant { id: String },
}

impl SelectionCriterion {
    /// Chart kinds this criterion applies to
    pub fn supported_by(&self, chart: ChartKind) -> bool {
        matches!(
            (self, chart),
            (SelectionCriterion::Bin { .. }, ChartKind::Histogram)
                | (SelectionCriterion::Box { .. }, ChartKind::ResultsOverTime)
                | (SelectionCriterion::Brush { .. }, ChartKind::ShiftPlot)
                | (SelectionCriterion::ScreenBrush { .. }, ChartKind::ShiftPlot)
                | (SelectionCriterion::Participant { .. }, ChartKind::OutlierExplorer)
        )
    }
}

/// Rows of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DetailTable {
    /// One row per record, one cell per detail column
    pub fn from_records(records: &[RecordRef], columns: &[DetailColumn]) -> Self {
        Self {
            headers: columns.iter().map(|c| c.label.clone()).collect(),
            rows: records
                .iter()
                .map(|r| columns.iter().map(|c| r.text(&c.value_col)).collect())
                .collect(),
        }
    }

    /// One row per shift point, followed by the detail columns of its participant
    pub fn from_shift_points(points: &[ShiftPoint], columns: &[DetailColumn], precision: usize) -> Self {
        let mut headers: Vec<String> = [
            "Subject ID",
            "Baseline Value",
            "Comparison Value",
            "Change",
            "Percent Change",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        headers.extend(columns.iter().map(|c| c.label.clone()));

        let rows = points
            .iter()
            .map(|p| {
                let mut row = vec![
                    p.participant.clone(),
                    format_number(p.baseline, precision),
                    format_number(p.comparison, precision),
                    format_number(p.change, precision),
                    p.percent_change
                        .map(|pct| format!("{:.0}%", pct))
                        .unwrap_or_default(),
                ];
                row.extend(
                    columns
                        .iter()
                        .map(|c| p.record.as_ref().map(|r| r.text(&c.value_col)).unwrap_or_default()),
                );
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One measure of one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurePanel {
    pub measure: String,
    pub label: String,
    /// In time order
    pub points: Vec<(Position, f64)>,
    /// Lowest lower limit to highest upper limit over the participant's records
    pub normal_range: Option<NormalRange>,
    /// Covers both the values and the normal range
    pub domain: LinearDomain,
}

/// All measures for one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmallMultiples {
    pub participant: String,
    pub header: String,
    /// `(label, value)` pairs from the detail columns
    pub details: Vec<(String, String)>,
    pub panels: Vec<MeasurePanel>,
}

impl SmallMultiples {
    /// Build panels from every cleaned record of the participant
    ///
    /// `measures` fixes panel order; `visit_order` orders ordinal time values.
    pub fn build(
        participant: &str,
        records: &[RecordRef],
        columns: &ColumnRoles,
        measures: &[String],
        time: &TimeColumn,
        visit_order: &[String],
        details: &[DetailColumn],
    ) -> Self {
        let own: Vec<&RecordRef> = records
            .iter()
            .filter(|r| r.text(&columns.id_col) == participant)
            .collect();

        let details = own
            .first()
            .map(|first| {
                details
                    .iter()
                    .filter(|d| first.has_column(&d.value_col))
                    .map(|d| (d.label.clone(), first.text(&d.value_col)))
                    .collect()
            })
            .unwrap_or_default();

        let panels = measures
            .iter()
            .filter_map(|measure| {
                let rows: Vec<&RecordRef> = own
                    .iter()
                    .copied()
                    .filter(|r| &measure_name(r, columns) == measure)
                    .collect();
                measure_panel(measure, &rows, columns, time, visit_order)
            })
            .collect();

        Self {
            participant: participant.to_string(),
            header: format!("All Measures for {}", participant),
            details,
            panels,
        }
    }
}

fn measure_panel(
    measure: &str,
    rows: &[&RecordRef],
    columns: &ColumnRoles,
    time: &TimeColumn,
    visit_order: &[String],
) -> Option<MeasurePanel> {
    let first = rows.first()?;

    let mut keyed: Vec<(f64, Position, f64)> = rows
        .iter()
        .filter_map(|r| {
            let value = r.number(&columns.value_col)?;
            match time.scale {
                TimeScale::Linear => {
                    let t = r.number(&time.value_col)?;
                    Some((t, Position::Value(t), value))
                }
                TimeScale::Ordinal => {
                    let visit = r.text(&time.value_col);
                    let rank = visit_order
                        .iter()
                        .position(|v| *v == visit)
                        .map(|i| i as f64)
                        .unwrap_or(f64::INFINITY);
                    Some((rank, Position::Category(visit), value))
                }
            }
        })
        .collect();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let low = rows
        .iter()
        .filter_map(|r| r.number(&columns.normal_col_low))
        .fold(f64::INFINITY, f64::min);
    let high = rows
        .iter()
        .filter_map(|r| r.number(&columns.normal_col_high))
        .fold(f64::NEG_INFINITY, f64::max);
    let normal_range = NormalRange::new(low, high);

    let values = keyed.iter().map(|k| k.2);
    let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if let Some(range) = normal_range {
        lo = lo.min(range.low);
        hi = hi.max(range.high);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }

    Some(MeasurePanel {
        measure: measure.to_string(),
        label: axis_label(measure, &first.text(&columns.unit_col)),
        points: keyed.into_iter().map(|(_, p, v)| (p, v)).collect(),
        normal_range,
        domain: LinearDomain::fit(lo, hi),
    })
}

/// Current contents of the detail area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailView {
    pub selection: Option<SelectionCriterion>,
    pub footnote: String,
    pub table: Option<DetailTable>,
    pub small_multiples: Option<SmallMultiples>,
    /// Selected records
    #[serde(skip)]
    pub records: Vec<RecordRef>,
}

impl DetailView {
    /// Nothing selected
    pub fn empty(chart: ChartKind) -> Self {
        Self {
            selection: None,
            footnote: chart.default_footnote().to_string(),
            table: None,
            small_multiples: None,
            records: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.selection.is_some()
    }
}

/// Footnote for a selected histogram bar
pub fn bin_footnote(count: usize, measure: &str, low: f64, high: f64, unit: &str) -> String {
    let unit = if unit.is_empty() {
        String::new()
    } else {
        format!(" {}", unit)
    };
    format!(
        "Table displays {} records with {} values from {:.3} to {:.3}{}. Click outside a bar to remove details.",
        count, measure, low, high, unit
    )
}

/// Footnote for a selected box
pub fn box_footnote(count: usize, visit: &str, group: &str) -> String {
    format!(
        "Table displays {} records at {} for {}. Click outside a box to remove details.",
        count, visit, group
    )
}

/// Footnote for a brushed region
pub fn brush_footnote(count: usize) -> String {
    format!("Details of {} selected points:", count)
}
