//! Filter state store
//!
//! The single mutable piece of chart state. It holds the current value of
//! every control (subsetters, measure and group pickers, toggles, axis
//! limits, brush extent, shift-plot visit sets) and persists across draw
//! cycles until explicitly reset.

use serde::{Deserialize, Serialize};

use vigil_data::RecordRef;

use crate::error::{FilterError, FilterResult};
use crate::eval::apply;
use crate::filter::{Filter, Selection};

/// Boolean display options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    NormalRange,
    BoxPlots,
    Violins,
    VisitsWithoutData,
    UnscheduledVisits,
}

/// Current value of every boolean display option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    pub normal_range: bool,
    pub box_plots: bool,
    pub violins: bool,
    pub visits_without_data: bool,
    pub unscheduled_visits: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            normal_range: true,
            box_plots: true,
            violins: false,
            visits_without_data: false,
            unscheduled_visits: false,
        }
    }
}

impl Toggles {
    pub fn get(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::NormalRange => self.normal_range,
            Toggle::BoxPlots => self.box_plots,
            Toggle::Violins => self.violins,
            Toggle::VisitsWithoutData => self.visits_without_data,
            Toggle::UnscheduledVisits => self.unscheduled_visits,
        }
    }

    pub fn set(&mut self, toggle: Toggle, value: bool) {
        let slot = match toggle {
            Toggle::NormalRange => &mut self.normal_range,
            Toggle::BoxPlots => &mut self.box_plots,
            Toggle::Violins => &mut self.violins,
            Toggle::VisitsWithoutData => &mut self.visits_without_data,
            Toggle::UnscheduledVisits => &mut self.unscheduled_visits,
        };
        *slot = value;
    }
}

/// User-entered bounds for the value axis
///
/// Either end may be unset; the pipeline fills unset ends from the data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisLimits {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl AxisLimits {
    /// Both ends set
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }
}

/// A rectangular brush in data coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushExtent {
    /// `(x0, x1)`, in either order
    pub x: (f64, f64),
    /// `(y0, y1)`, in either order
    pub y: (f64, f64),
}

impl BrushExtent {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self { x, y }
    }

    /// Whether a point lies inside the brush (edges included)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let (x0, x1) = ordered(self.x);
        let (y0, y1) = ordered(self.y);
        x >= x0 && x <= x1 && y >= y0 && y <= y1
    }

    /// Whether the brush covers no area
    pub fn is_empty(&self) -> bool {
        self.x.0 == self.x.1 || self.y.0 == self.y.1
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Current value of every control
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterStore {
    filters: Vec<Filter>,
    measure: Option<String>,
    group: Option<String>,
    time_column: Option<String>,
    toggles: Toggles,
    limits: AxisLimits,
    brush: Option<BrushExtent>,
    baseline_visits: Vec<String>,
    comparison_visits: Vec<String>,
}

impl FilterStore {
    /// Create a store over pruned filters
    pub fn new(filters: Vec<Filter>, toggles: Toggles) -> Self {
        Self {
            filters,
            toggles,
            ..Self::default()
        }
    }

    /// Records passing every subsetter
    pub fn apply(&self, records: &[RecordRef]) -> Vec<RecordRef> {
        apply(records, &self.filters)
    }

    /// All subsetters, in configured order
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Subsetters currently restricting the data
    pub fn active_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(|f| f.is_active())
    }

    /// Change the selection of one subsetter
    pub fn set_filter(&mut self, column: &str, selection: Selection) -> FilterResult<()> {
        let filter = self
            .filters
            .iter_mut()
            .find(|f| f.column == column)
            .ok_or_else(|| FilterError::UnknownFilter(column.to_string()))?;

        if let Some(level) = selection
            .levels()
            .into_iter()
            .find(|l| !filter.levels.iter().any(|known| known.as_str() == *l))
        {
            return Err(FilterError::UnknownLevel {
                column: column.to_string(),
                level: level.to_string(),
            });
        }

        if !filter.multiple && matches!(&selection, Selection::Many(_)) {
            return Err(FilterError::NotMultiSelect(column.to_string()));
        }

        tracing::debug!("filter {} set to {:?}", column, selection);
        filter.selection = selection;
        Ok(())
    }

    /// Put every subsetter back to "All"
    pub fn reset_filters(&mut self) {
        for filter in &mut self.filters {
            filter.selection = Selection::All;
        }
    }

    pub fn measure(&self) -> Option<&str> {
        self.measure.as_deref()
    }

    pub fn set_measure(&mut self, measure: impl Into<String>) {
        self.measure = Some(measure.into());
    }

    /// Grouping column, or the placeholder for "no grouping"
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn set_group(&mut self, group: impl Into<String>) {
        self.group = Some(group.into());
    }

    /// Column on the time axis
    pub fn time_column(&self) -> Option<&str> {
        self.time_column.as_deref()
    }

    pub fn set_time_column(&mut self, column: impl Into<String>) {
        self.time_column = Some(column.into());
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn set_toggle(&mut self, toggle: Toggle, value: bool) {
        self.toggles.set(toggle, value);
    }

    pub fn limits(&self) -> AxisLimits {
        self.limits
    }

    /// Replace both limits
    pub fn set_limits(&mut self, limits: AxisLimits) {
        self.limits = limits;
    }

    pub fn set_lower_limit(&mut self, lower: f64) {
        self.limits.lower = Some(lower);
    }

    pub fn set_upper_limit(&mut self, upper: f64) {
        self.limits.upper = Some(upper);
    }

    pub fn brush(&self) -> Option<BrushExtent> {
        self.brush
    }

    /// Set or clear the brush
    pub fn set_brush(&mut self, brush: Option<BrushExtent>) {
        self.brush = brush.filter(|b| !b.is_empty());
    }

    pub fn baseline_visits(&self) -> &[String] {
        &self.baseline_visits
    }

    pub fn set_baseline_visits(&mut self, visits: Vec<String>) {
        self.baseline_visits = visits;
    }

    pub fn comparison_visits(&self) -> &[String] {
        &self.comparison_visits
    }

    pub fn set_comparison_visits(&mut self, visits: Vec<String>) {
        self.comparison_visits = visits;
    }
}
