//! Draw-cycle stages
//!
//! Each stage reads what the previous one derived and writes its own part of
//! [`ChartState`]. The order is fixed: preprocess, datatransform, draw,
//! resize. Layout runs once after init.

use std::collections::{BTreeSet, HashMap, HashSet};

use vigil_data::{numeric_values, Diagnostics, DiagnosticKind, RecordRef};
use vigil_filter::{AxisLimits, BrushExtent};
use vigil_stats::{
    display_precision, extent, normal_range_bands, Histogram, NormalRange, NormalRangeBand,
    SummaryStats, ViolinProfile,
};

use crate::axis::{axis_label, nice_ticks, value_ticks, AxisDomain, LinearDomain};
use crate::config::{AxisBehavior, ChartKind, TimeScale, ALL_PARTICIPANTS};
use crate::controls::{ControlPanel, PanelInputs};
use crate::detail::{
    bin_footnote, box_footnote, brush_footnote, DetailTable, DetailView, SelectionCriterion,
    SmallMultiples,
};
use crate::frame::{
    AxisFrame, HistogramBar, Legend, Mark, Orientation, Position, ReferenceLine, RenderFrame,
    StatOverlay,
};
use crate::layout::{box_width, group_offsets, BandScale};
use crate::population::PopulationAnnotation;
use crate::resolver::measure_name;
use crate::shift::{shift_points, ShiftPoint, ShiftStats, ShiftVisits};
use crate::state::ChartState;

/// Share of the plot size used by a single overlay spanning the chart
const SINGLE_OVERLAY_WIDTH: f32 = 0.05;

impl ChartState {
    /// Layout: publish the control panel
    pub(crate) fn layout(&mut self) {
        self.refresh_controls();
    }

    /// Preprocess: derive the measure data, filtered data and axis domains
    pub(crate) fn preprocess(&mut self, diagnostics: &mut Diagnostics) {
        let chart = self.settings.chart;
        let measure = self.store.measure().map(str::to_string);
        self.measure_changed = measure != self.previous_measure;
        self.previous_measure = measure.clone();

        let show_unscheduled = self.store.toggles().unscheduled_visits;
        self.measure_data = match &measure {
            Some(m) => self
                .data
                .records
                .iter()
                .filter(|r| measure_name(r, &self.settings.columns) == *m)
                .filter(|r| show_unscheduled || !self.is_unscheduled(r))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        let columns = &self.settings.columns;
        self.normal_ranges = self
            .measure_data
            .iter()
            .filter_map(|r| {
                NormalRange::new(r.number(&columns.normal_col_low)?, r.number(&columns.normal_col_high)?)
            })
            .collect();

        let visits = self
            .visit_col()
            .map(|c| self.visits(c).to_vec())
            .unwrap_or_default();
        self.shift_visits = ShiftVisits::resolve(
            self.store.baseline_visits(),
            self.store.comparison_visits(),
            &visits,
        );

        // unset ends come from the data
        let natural = self.natural_extent();
        let limits = self.store.limits();
        let domain = LinearDomain::normalized(
            limits.lower.unwrap_or(natural.0),
            limits.upper.unwrap_or(natural.1),
            diagnostics,
        );
        self.store.set_limits(AxisLimits::new(domain.min, domain.max));
        self.value_domain = domain;
        self.natural_domain = LinearDomain::fit(natural.0, natural.1);

        let filtered = self.store.apply(&self.measure_data);
        self.derived = match chart {
            ChartKind::Histogram => {
                let value_col = &self.settings.columns.value_col;
                filtered
                    .into_iter()
                    .filter(|r| r.number(value_col).map_or(false, |v| domain.contains(v)))
                    .collect()
            }
            _ => filtered,
        };

        match chart {
            ChartKind::ResultsOverTime | ChartKind::OutlierExplorer => {
                self.x_domain = self.time_domain();
                self.y_domain = AxisDomain::linear(domain);
            }
            ChartKind::Histogram => {
                self.x_domain = AxisDomain::linear(domain);
            }
            ChartKind::ShiftPlot => {
                self.x_domain = AxisDomain::linear(domain);
                self.y_domain = AxisDomain::linear(domain);
            }
        }

        self.refresh_controls();
    }

    /// Datatransform: labels, stale selections and per-kind derived data
    pub(crate) fn datatransform(&mut self, diagnostics: &mut Diagnostics) {
        let chart = self.settings.chart;
        let unit_col = &self.settings.columns.unit_col;
        self.unit = self
            .derived
            .first()
            .or_else(|| self.measure_data.first())
            .map(|r| r.text(unit_col))
            .unwrap_or_default();
        let measure = self.measure().unwrap_or_default().to_string();
        self.value_label = axis_label(&measure, &self.unit);

        if self.measure_changed {
            self.clear_selection();
            if chart == ChartKind::Histogram && self.normal_ranges.is_empty() && !measure.is_empty() {
                diagnostics.push(DiagnosticKind::NoNormalRange { measure });
            }
        }

        self.histogram = None;
        self.shift_points.clear();
        match chart {
            ChartKind::Histogram => {
                let values = numeric_values(&self.derived, &self.settings.columns.value_col);
                let histogram = Histogram::with_domain(
                    &values,
                    self.value_domain.as_tuple(),
                    self.settings.histogram_bins,
                );
                self.y_domain = AxisDomain::linear(LinearDomain {
                    min: 0.0,
                    max: histogram.max_count().max(1) as f64,
                });
                self.histogram = Some(histogram);
            }
            ChartKind::ShiftPlot => {
                self.shift_points = self.compute_shift_points(&self.derived);
            }
            ChartKind::ResultsOverTime | ChartKind::OutlierExplorer => {}
        }
    }

    /// Draw: bind the derived data to marks and annotate the population
    pub(crate) fn draw(&mut self) {
        let chart = self.settings.chart;
        let precision = self.precision();
        let values = numeric_values(&self.derived, &self.settings.columns.value_col);
        let value_stats = SummaryStats::from_data(&values);

        let mut frame = RenderFrame::empty(chart, self.settings.plot);
        frame.measure = self.measure().map(str::to_string);
        let value_axis = AxisFrame {
            label: self.value_label.clone(),
            domain: AxisDomain::linear(self.value_domain),
            ticks: value_ticks(self.value_domain, 5, value_stats.as_ref(), precision),
        };

        match chart {
            ChartKind::ResultsOverTime | ChartKind::OutlierExplorer => {
                frame.x_axis = self.time_axis();
                frame.y_axis = value_axis;
                if chart == ChartKind::OutlierExplorer {
                    frame.marks = self.participant_marks();
                }
            }
            ChartKind::Histogram => {
                let counts = self.y_domain.as_linear().unwrap_or_default();
                frame.x_axis = value_axis;
                frame.y_axis = AxisFrame {
                    label: "# of Observations".to_string(),
                    domain: self.y_domain.clone(),
                    ticks: nice_ticks(counts, 5, 0)
                        .into_iter()
                        .filter(|t| t.value.fract() == 0.0)
                        .collect(),
                };
                frame.bars = self
                    .histogram
                    .iter()
                    .flat_map(|h| h.bins.iter().enumerate())
                    .map(|(index, bin)| HistogramBar {
                        index,
                        x0: bin.x0,
                        x1: bin.x1,
                        count: bin.count,
                        selected: false,
                    })
                    .collect();
                if self.store.toggles().normal_range {
                    frame.normal_ranges = self.normal_range_bands();
                }
            }
            ChartKind::ShiftPlot => {
                frame.x_axis = AxisFrame {
                    label: format!("Baseline {}", self.value_label),
                    ..value_axis.clone()
                };
                frame.y_axis = AxisFrame {
                    label: format!("Comparison {}", self.value_label),
                    ..value_axis
                };
                frame.marks = self
                    .shift_points
                    .iter()
                    .map(|p| Mark::Point {
                        participant: p.participant.clone(),
                        group: p
                            .record
                            .as_ref()
                            .map(|r| self.group_value(r))
                            .unwrap_or_else(|| ALL_PARTICIPANTS.to_string()),
                        x: Position::Value(p.baseline),
                        y: p.comparison,
                        abnormal: false,
                    })
                    .collect();
                let d = self.value_domain;
                frame.reference_line = Some(ReferenceLine {
                    from: (d.min, d.min),
                    to: (d.max, d.max),
                });
            }
        }

        frame.legend = self.legend();
        frame.population = self.population();
        frame.controls = self.controls.clone();
        self.frame = frame;

        if let Some(criterion) = self.selection.clone() {
            self.detail = self.detail_for(&criterion);
        }
        self.mark_selection();
    }

    /// Resize: statistical overlays laid out for the current plot size
    pub(crate) fn resize(&mut self) {
        self.frame.plot = self.settings.plot;
        self.frame.overlays = self.overlays();
    }

    /// Drop the selection and restore the default footnote
    pub(crate) fn clear_selection(&mut self) {
        self.selection = None;
        self.detail = DetailView::empty(self.settings.chart);
        self.store.set_brush(None);
        self.mark_selection();
    }

    /// Flag selected bars and lines in the current frame
    pub(crate) fn mark_selection(&mut self) {
        let selected_bin = match &self.selection {
            Some(SelectionCriterion::Bin { index }) => Some(*index),
            _ => None,
        };
        let selected_id = match &self.selection {
            Some(SelectionCriterion::Participant { id }) => Some(id.clone()),
            _ => None,
        };
        for bar in &mut self.frame.bars {
            bar.selected = Some(bar.index) == selected_bin;
        }
        for mark in &mut self.frame.marks {
            if let Mark::Line {
                participant,
                selected,
                ..
            } = mark
            {
                *selected = selected_id.as_deref() == Some(participant.as_str());
            }
        }
    }

    /// Data-coordinate brush for a screen-space rectangle
    pub fn screen_brush(&self, x: (f32, f32), y: (f32, f32)) -> BrushExtent {
        let area = self.plot_area();
        let (x0, y0) = area.pixel_to_data(x.0, y.0);
        let (x1, y1) = area.pixel_to_data(x.1, y.1);
        BrushExtent::new((x0, x1), (y0, y1))
    }

    /// Detail view for a selection against the current derived data
    pub(crate) fn detail_for(&self, criterion: &SelectionCriterion) -> DetailView {
        let chart = self.settings.chart;
        let columns = &self.settings.columns;
        let details = &self.settings.details;
        let mut view = DetailView::empty(chart);
        view.selection = Some(criterion.clone());

        match criterion {
            SelectionCriterion::Bin { index } => {
                let Some(histogram) = &self.histogram else {
                    return view;
                };
                let Some(bin) = histogram.bins.get(*index) else {
                    return view;
                };
                let records: Vec<RecordRef> = self
                    .derived
                    .iter()
                    .filter(|r| {
                        r.number(&columns.value_col)
                            .and_then(|v| histogram.bin_index(v))
                            == Some(*index)
                    })
                    .cloned()
                    .collect();
                view.footnote = bin_footnote(
                    records.len(),
                    self.measure().unwrap_or_default(),
                    bin.x0,
                    bin.x1,
                    &self.unit,
                );
                view.table = Some(DetailTable::from_records(&records, details));
                view.records = records;
            }
            SelectionCriterion::Box { visit, group } => {
                let Some(time) = self.time_col() else {
                    return view;
                };
                let records: Vec<RecordRef> = self
                    .derived
                    .iter()
                    .filter(|r| r.text(&time.value_col) == *visit && self.group_value(r) == *group)
                    .cloned()
                    .collect();
                view.footnote = box_footnote(records.len(), visit, group);
                view.table = Some(DetailTable::from_records(&records, details));
                view.records = records;
            }
            SelectionCriterion::Brush { extent } => {
                let points: Vec<ShiftPoint> = self
                    .shift_points
                    .iter()
                    .filter(|p| extent.contains(p.baseline, p.comparison))
                    .cloned()
                    .collect();
                let ids: HashSet<&str> = points.iter().map(|p| p.participant.as_str()).collect();
                view.footnote = brush_footnote(points.len());
                view.table = Some(DetailTable::from_shift_points(&points, details, self.precision()));
                view.records = self
                    .derived
                    .iter()
                    .filter(|r| ids.contains(r.text(&columns.id_col).as_str()))
                    .cloned()
                    .collect();
            }
            SelectionCriterion::ScreenBrush { x, y } => {
                return self.detail_for(&SelectionCriterion::Brush {
                    extent: self.screen_brush(*x, *y),
                });
            }
            SelectionCriterion::Participant { id } => {
                let Some(time) = self.time_col() else {
                    return view;
                };
                let visits = self.visits(&time.value_col);
                view.small_multiples = Some(SmallMultiples::build(
                    id,
                    &self.data.records,
                    columns,
                    &self.data.measures,
                    time,
                    visits,
                    details,
                ));
                view.records = self
                    .data
                    .records
                    .iter()
                    .filter(|r| r.text(&columns.id_col) == *id)
                    .cloned()
                    .collect();
            }
        }
        view
    }

    fn refresh_controls(&mut self) {
        let visits = self
            .visit_col()
            .map(|c| self.visits(c).to_vec())
            .unwrap_or_default();
        let limits = self.store.limits();
        let reset_enabled = limits.lower != Some(self.natural_domain.min)
            || limits.upper != Some(self.natural_domain.max);
        self.controls = ControlPanel::build(
            &self.settings,
            &self.store,
            PanelInputs {
                measures: &self.data.measures,
                groups: &self.groups,
                visits: &visits,
                has_normal_range: !self.normal_ranges.is_empty(),
                reset_enabled,
            },
        );
    }

    /// Data-driven bounds of the current measure before normalization
    fn natural_extent(&self) -> (f64, f64) {
        if let AxisBehavior::Fixed { min, max } = self.settings.value_axis {
            return (min, max);
        }
        let found = match self.settings.chart {
            ChartKind::ShiftPlot => {
                let values: Vec<f64> = self
                    .compute_shift_points(&self.measure_data)
                    .iter()
                    .flat_map(|p| [p.baseline, p.comparison])
                    .collect();
                extent(&values)
            }
            _ => extent(&numeric_values(
                &self.measure_data,
                &self.settings.columns.value_col,
            )),
        };
        found.unwrap_or((0.0, 1.0))
    }

    fn compute_shift_points(&self, records: &[RecordRef]) -> Vec<ShiftPoint> {
        let Some(visit_col) = self.visit_col() else {
            return Vec::new();
        };
        let stats = ShiftStats {
            baseline: self.settings.shift.baseline_stat,
            comparison: self.settings.shift.comparison_stat,
        };
        shift_points(
            records,
            &self.settings.columns,
            visit_col,
            &self.shift_visits,
            stats,
        )
    }

    /// Ordinal visits or linear time extent for the x axis
    fn time_domain(&self) -> AxisDomain {
        let Some(time) = self.time_col() else {
            return AxisDomain::ordinal(Vec::new());
        };
        let toggles = self.store.toggles();
        match time.scale {
            TimeScale::Ordinal => {
                let present: HashSet<String> = self
                    .derived
                    .iter()
                    .map(|r| r.text(&time.value_col))
                    .collect();
                let categories = self
                    .visits(&time.value_col)
                    .iter()
                    .filter(|v| {
                        toggles.unscheduled_visits || !self.settings.unscheduled.is_unscheduled(v)
                    })
                    .filter(|v| toggles.visits_without_data || present.contains(*v))
                    .cloned()
                    .collect();
                AxisDomain::ordinal(categories)
            }
            TimeScale::Linear => {
                let values = numeric_values(&self.derived, &time.value_col);
                let domain = extent(&values)
                    .map(|(lo, hi)| LinearDomain::fit(lo, hi))
                    .unwrap_or_default();
                AxisDomain::linear(domain)
            }
        }
    }

    fn time_axis(&self) -> AxisFrame {
        let label = self.time_col().map(|t| t.label.clone()).unwrap_or_default();
        let ticks = match self.x_domain.as_linear() {
            Some(domain) => nice_ticks(domain, 5, 0),
            None => Vec::new(),
        };
        AxisFrame {
            label,
            domain: self.x_domain.clone(),
            ticks,
        }
    }

    /// One line per participant plus a point per result
    fn participant_marks(&self) -> Vec<Mark> {
        let Some(time) = self.time_col() else {
            return Vec::new();
        };
        let columns = &self.settings.columns;
        let categories = self.x_domain.categories();

        let mut order: Vec<String> = Vec::new();
        let mut lines: HashMap<String, (String, Vec<(f64, Position, f64)>)> = HashMap::new();
        let mut points: Vec<Mark> = Vec::new();

        for record in &self.derived {
            let Some(value) = record.number(&columns.value_col) else {
                continue;
            };
            let (key, position) = match (time.scale, categories) {
                (TimeScale::Ordinal, Some(categories)) => {
                    let visit = record.text(&time.value_col);
                    let Some(rank) = categories.iter().position(|c| *c == visit) else {
                        continue;
                    };
                    (rank as f64, Position::Category(visit))
                }
                _ => {
                    let Some(t) = record.number(&time.value_col) else {
                        continue;
                    };
                    (t, Position::Value(t))
                }
            };

            let id = record.text(&columns.id_col);
            let group = self.group_value(record);
            let abnormal = record
                .number(&columns.normal_col_low)
                .map_or(false, |low| value < low)
                || record
                    .number(&columns.normal_col_high)
                    .map_or(false, |high| value > high);

            points.push(Mark::Point {
                participant: id.clone(),
                group: group.clone(),
                x: position.clone(),
                y: value,
                abnormal,
            });
            lines
                .entry(id.clone())
                .or_insert_with(|| {
                    order.push(id);
                    (group, Vec::new())
                })
                .1
                .push((key, position, value));
        }

        let mut marks: Vec<Mark> = order
            .into_iter()
            .filter_map(|id| {
                let (group, mut line) = lines.remove(&id)?;
                line.sort_by(|a, b| a.0.total_cmp(&b.0));
                Some(Mark::Line {
                    participant: id,
                    group,
                    points: line.into_iter().map(|(_, p, v)| (p, v)).collect(),
                    selected: false,
                })
            })
            .collect();
        marks.extend(points);
        marks
    }

    fn normal_range_bands(&self) -> Vec<NormalRangeBand> {
        let columns = &self.settings.columns;
        let domain = self.value_domain.as_tuple();
        normal_range_bands(self.derived.iter().filter_map(|r| {
            NormalRange::new(r.number(&columns.normal_col_low)?, r.number(&columns.normal_col_high)?)
                .map(|range| range.clipped(domain))
        }))
    }

    fn legend(&self) -> Option<Legend> {
        if self.settings.chart == ChartKind::Histogram {
            return None;
        }
        let group = self.group().filter(|g| !g.is_placeholder())?;
        let entries: BTreeSet<String> = self
            .derived
            .iter()
            .map(|r| r.text(&group.value_col))
            .collect();
        Some(Legend {
            label: group.label.clone(),
            entries: entries.into_iter().collect(),
        })
    }

    fn population(&self) -> PopulationAnnotation {
        let unit = &self.settings.population_unit;
        let total = self.data.population_count;
        match self.settings.chart {
            ChartKind::ShiftPlot => {
                let d = self.value_domain;
                let shown: HashSet<&str> = self
                    .shift_points
                    .iter()
                    .filter(|p| d.contains(p.baseline) && d.contains(p.comparison))
                    .map(|p| p.participant.as_str())
                    .collect();
                PopulationAnnotation::new(shown.len(), total, unit.as_str())
            }
            _ => PopulationAnnotation::from_records(
                &self.derived,
                &self.settings.columns.id_col,
                total,
                unit,
            ),
        }
    }

    fn precision(&self) -> usize {
        display_precision(self.value_domain.min, self.value_domain.max)
    }

    fn overlays(&self) -> Vec<StatOverlay> {
        let toggles = self.store.toggles();
        let plot = self.settings.plot;
        let precision = self.precision();
        let value_col = &self.settings.columns.value_col;

        let overlay = |position: Option<Position>,
                       group: String,
                       orientation: Orientation,
                       offset: f32,
                       width: f32,
                       values: &[f64],
                       show_box: bool,
                       violin: bool| {
            let stats = SummaryStats::from_data(values)?;
            let violin = if violin {
                ViolinProfile::from_data(values, self.settings.violin_bins)
            } else {
                None
            };
            if !show_box && violin.is_none() {
                return None;
            }
            Some(StatOverlay {
                position,
                group,
                orientation,
                offset,
                width,
                tooltip: stats.tooltip(precision),
                stats,
                show_box,
                violin,
            })
        };

        match self.settings.chart {
            ChartKind::ResultsOverTime => {
                let (Some(time), Some(categories)) = (self.time_col(), self.x_domain.categories())
                else {
                    return Vec::new();
                };
                let mut buckets: HashMap<(String, String), Vec<f64>> = HashMap::new();
                for record in &self.derived {
                    if let Some(value) = record.number(value_col) {
                        buckets
                            .entry((record.text(&time.value_col), self.group_value(record)))
                            .or_default()
                            .push(value);
                    }
                }
                let groups: Vec<String> = buckets
                    .keys()
                    .map(|(_, g)| g.clone())
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();

                let scale = BandScale::new(categories.to_vec(), plot.width);
                let offsets = group_offsets(groups.len(), scale.bandwidth());
                let width = box_width(scale.bandwidth(), groups.len());

                let mut overlays = Vec::new();
                for visit in categories {
                    for (group, &offset) in groups.iter().zip(&offsets) {
                        let Some(values) = buckets.get(&(visit.clone(), group.clone())) else {
                            continue;
                        };
                        overlays.extend(overlay(
                            Some(Position::Category(visit.clone())),
                            group.clone(),
                            Orientation::Vertical,
                            offset,
                            width,
                            values,
                            toggles.box_plots,
                            toggles.violins,
                        ));
                    }
                }
                overlays
            }
            ChartKind::OutlierExplorer => {
                let values = numeric_values(&self.derived, value_col);
                overlay(
                    None,
                    ALL_PARTICIPANTS.to_string(),
                    Orientation::Vertical,
                    0.0,
                    plot.width * SINGLE_OVERLAY_WIDTH,
                    &values,
                    true,
                    false,
                )
                .into_iter()
                .collect()
            }
            ChartKind::Histogram => {
                let values = numeric_values(&self.derived, value_col);
                overlay(
                    None,
                    ALL_PARTICIPANTS.to_string(),
                    Orientation::Horizontal,
                    0.0,
                    plot.height * SINGLE_OVERLAY_WIDTH,
                    &values,
                    toggles.box_plots,
                    false,
                )
                .into_iter()
                .collect()
            }
            ChartKind::ShiftPlot => {
                let baseline: Vec<f64> = self.shift_points.iter().map(|p| p.baseline).collect();
                let comparison: Vec<f64> = self.shift_points.iter().map(|p| p.comparison).collect();
                let x = overlay(
                    None,
                    "Baseline".to_string(),
                    Orientation::Horizontal,
                    0.0,
                    plot.height * SINGLE_OVERLAY_WIDTH,
                    &baseline,
                    toggles.box_plots,
                    false,
                );
                let y = overlay(
                    None,
                    "Comparison".to_string(),
                    Orientation::Vertical,
                    0.0,
                    plot.width * SINGLE_OVERLAY_WIDTH,
                    &comparison,
                    toggles.box_plots,
                    false,
                );
                x.into_iter().chain(y).collect()
            }
        }
    }
}
