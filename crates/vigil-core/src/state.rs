//! Per-chart state
//!
//! Built once by the init stage. Everything except the settings, the
//! resolved data and the filter store is recomputed on every cycle.

use std::collections::HashMap;

use vigil_data::{Dataset, Diagnostics, Record, RecordRef};
use vigil_filter::{build_filters, FilterStore};
use vigil_stats::{Histogram, NormalRange};

use crate::axis::{AxisDomain, LinearDomain, PlotArea};
use crate::config::{
    GroupDefinition, ResolvedSettings, TimeColumn, TimeScale, ALL_PARTICIPANTS, NO_GROUP,
};
use crate::controls::ControlPanel;
use crate::detail::{DetailView, SelectionCriterion};
use crate::frame::RenderFrame;
use crate::resolver::{available_groups, resolve_data, visit_order, ResolvedData};
use crate::shift::{ShiftPoint, ShiftVisits};

/// State owned by one chart instance
#[derive(Debug, Clone)]
pub struct ChartState {
    pub settings: ResolvedSettings,
    pub data: ResolvedData,
    /// Groupings whose column exists, placeholder first
    pub groups: Vec<GroupDefinition>,
    /// Visit order per ordinal time column
    pub visit_orders: HashMap<String, Vec<String>>,
    pub store: FilterStore,

    pub measure_changed: bool,
    pub(crate) previous_measure: Option<String>,

    /// Records of the current measure, unscheduled visits removed unless shown
    pub measure_data: Vec<RecordRef>,
    /// `measure_data` after filters (and, for the histogram, the value domain)
    pub derived: Vec<RecordRef>,
    /// Domain the limits reset to
    pub natural_domain: LinearDomain,
    pub value_domain: LinearDomain,
    pub x_domain: AxisDomain,
    pub y_domain: AxisDomain,
    pub unit: String,
    pub value_label: String,
    pub normal_ranges: Vec<NormalRange>,
    pub histogram: Option<Histogram>,
    pub shift_visits: ShiftVisits,
    pub shift_points: Vec<ShiftPoint>,

    pub controls: ControlPanel,
    pub selection: Option<SelectionCriterion>,
    pub detail: DetailView,
    pub frame: RenderFrame,
    /// Completed draw cycles
    pub cycles: usize,
}

impl ChartState {
    /// Init stage: clean the data, resolve measures and controls
    pub fn init(dataset: &Dataset, settings: ResolvedSettings, diagnostics: &mut Diagnostics) -> Self {
        let data = resolve_data(dataset, &settings, diagnostics);
        let groups = available_groups(&settings.groups, dataset, diagnostics);
        let filters = build_filters(&settings.filters, &data.records, diagnostics);

        let visit_orders: HashMap<String, Vec<String>> = settings
            .time_cols
            .iter()
            .filter(|t| t.scale == TimeScale::Ordinal)
            .map(|t| (t.value_col.clone(), visit_order(&data.records, t)))
            .collect();

        let mut store = FilterStore::new(filters, settings.toggles);
        if let Some(measure) = &data.initial_measure {
            store.set_measure(measure.clone());
        }
        let group = settings
            .color_by
            .as_deref()
            .filter(|c| groups.iter().any(|g| g.value_col == *c))
            .unwrap_or(NO_GROUP);
        store.set_group(group);
        if let Some(time) = settings.time_cols.first() {
            store.set_time_column(time.value_col.clone());
        }

        let visits = settings
            .time_cols
            .iter()
            .find(|t| t.scale == TimeScale::Ordinal)
            .and_then(|t| visit_orders.get(&t.value_col))
            .cloned()
            .unwrap_or_default();
        let shift_visits =
            ShiftVisits::resolve(&settings.shift.baseline_visits, &settings.shift.comparison_visits, &visits);
        store.set_baseline_visits(shift_visits.baseline.clone());
        store.set_comparison_visits(shift_visits.comparison.clone());

        let chart = settings.chart;
        let plot = settings.plot;
        Self {
            settings,
            data,
            groups,
            visit_orders,
            store,
            measure_changed: false,
            previous_measure: None,
            measure_data: Vec::new(),
            derived: Vec::new(),
            natural_domain: LinearDomain::default(),
            value_domain: LinearDomain::default(),
            x_domain: AxisDomain::default(),
            y_domain: AxisDomain::default(),
            unit: String::new(),
            value_label: String::new(),
            normal_ranges: Vec::new(),
            histogram: None,
            shift_visits,
            shift_points: Vec::new(),
            controls: ControlPanel::default(),
            selection: None,
            detail: DetailView::empty(chart),
            frame: RenderFrame::empty(chart, plot),
            cycles: 0,
        }
    }

    /// Time column currently on the x axis
    pub fn time_col(&self) -> Option<&TimeColumn> {
        self.store
            .time_column()
            .and_then(|c| self.settings.time_col(c))
            .or_else(|| self.settings.time_cols.first())
    }

    /// Column holding visit labels, used for unscheduled visits and shift visit sets
    pub fn visit_col(&self) -> Option<&str> {
        self.settings
            .time_cols
            .iter()
            .find(|t| t.scale == TimeScale::Ordinal)
            .map(|t| t.value_col.as_str())
    }

    /// Observed visits of a time column, in axis order
    pub fn visits(&self, column: &str) -> &[String] {
        self.visit_orders
            .get(column)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Selected grouping; `None` or the placeholder means no grouping
    pub fn group(&self) -> Option<&GroupDefinition> {
        let column = self.store.group().unwrap_or(NO_GROUP);
        self.groups.iter().find(|g| g.value_col == column)
    }

    /// Group a record belongs to under the selected grouping
    pub fn group_value(&self, record: &Record) -> String {
        match self.group() {
            Some(group) if !group.is_placeholder() => record.text(&group.value_col),
            _ => ALL_PARTICIPANTS.to_string(),
        }
    }

    /// Whether a record falls on an unscheduled visit
    pub fn is_unscheduled(&self, record: &Record) -> bool {
        match self.visit_col() {
            Some(col) => self.settings.unscheduled.is_unscheduled(&record.text(col)),
            None => false,
        }
    }

    /// Current measure
    pub fn measure(&self) -> Option<&str> {
        self.store.measure()
    }

    /// Pixel mapping for the linear axes of the current frame
    pub fn plot_area(&self) -> PlotArea {
        let x = self.x_domain.as_linear().unwrap_or(self.value_domain);
        let y = self.y_domain.as_linear().unwrap_or(self.value_domain);
        PlotArea::new(self.settings.plot, x, y)
    }
}
