//! Render frames
//!
//! A [`RenderFrame`] is the fully derived state of one draw cycle, ready for
//! a rendering adapter to turn into marks. It carries data coordinates only,
//! except for overlay offsets, which are pixels from the band center.

use serde::{Deserialize, Serialize};

use vigil_stats::{NormalRangeBand, SummaryStats, ViolinProfile};

use crate::axis::{AxisDomain, Tick};
use crate::config::{ChartKind, PlotSize};
use crate::controls::ControlPanel;
use crate::population::PopulationAnnotation;

/// Location along an axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "at", rename_all = "snake_case")]
pub enum Position {
    /// A category of an ordinal axis
    Category(String),
    /// A value on a linear axis
    Value(f64),
}

/// One axis, ready to draw
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisFrame {
    pub label: String,
    pub domain: AxisDomain,
    pub ticks: Vec<Tick>,
}

/// A data mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mark", rename_all = "snake_case")]
pub enum Mark {
    Point {
        participant: String,
        group: String,
        x: Position,
        y: f64,
        /// Value lies outside the record's normal range
        abnormal: bool,
    },
    Line {
        participant: String,
        group: String,
        points: Vec<(Position, f64)>,
        selected: bool,
    },
}

/// A histogram bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBar {
    pub index: usize,
    pub x0: f64,
    pub x1: f64,
    pub count: usize,
    pub selected: bool,
}

/// Direction in which an overlay's values run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Values along the y axis
    Vertical,
    /// Values along the x axis
    Horizontal,
}

/// Box plot and/or violin for one group at one axis position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatOverlay {
    /// Axis position; `None` for an overlay spanning the whole chart
    pub position: Option<Position>,
    pub group: String,
    pub orientation: Orientation,
    /// Pixels from the band center
    pub offset: f32,
    /// Box width in pixels
    pub width: f32,
    pub stats: SummaryStats,
    pub show_box: bool,
    pub violin: Option<ViolinProfile>,
    pub tooltip: String,
}

/// Legend title and entries in group order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub label: String,
    pub entries: Vec<String>,
}

/// Straight reference line in data coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

/// Everything a renderer needs for one draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub chart: ChartKind,
    pub measure: Option<String>,
    pub x_axis: AxisFrame,
    pub y_axis: AxisFrame,
    pub marks: Vec<Mark>,
    pub bars: Vec<HistogramBar>,
    pub overlays: Vec<StatOverlay>,
    /// Widest band first
    pub normal_ranges: Vec<NormalRangeBand>,
    pub legend: Option<Legend>,
    pub reference_line: Option<ReferenceLine>,
    pub population: PopulationAnnotation,
    pub controls: ControlPanel,
    pub plot: PlotSize,
}

impl RenderFrame {
    /// An empty frame for a chart kind
    pub fn empty(chart: ChartKind, plot: PlotSize) -> Self {
        Self {
            chart,
            measure: None,
            x_axis: AxisFrame::default(),
            y_axis: AxisFrame::default(),
            marks: Vec::new(),
            bars: Vec::new(),
            overlays: Vec::new(),
            normal_ranges: Vec::new(),
            legend: None,
            reference_line: None,
            population: PopulationAnnotation::default(),
            controls: ControlPanel::default(),
            plot,
        }
    }

    /// Axis carrying the measure values
    pub fn value_axis(&self) -> &AxisFrame {
        if self.chart.values_on_x() {
            &self.x_axis
        } else {
            &self.y_axis
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
