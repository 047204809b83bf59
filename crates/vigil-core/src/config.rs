//! Chart settings
//!
//! [`ChartSettings`] is the host-supplied, serde-friendly configuration. It is
//! never mutated after construction; [`ChartSettings::resolve`] is a pure
//! function producing the [`ResolvedSettings`] the pipeline actually reads
//! (compiled patterns, placeholder group, merged detail columns).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use vigil_data::default_missing_values;
use vigil_filter::{FilterDefinition, Toggles};

use crate::error::{ConfigError, ConfigResult};

/// Grouping placeholder meaning "do not split by group"
pub const NO_GROUP: &str = "NONE";

/// Group value every record takes when no grouping is selected
pub const ALL_PARTICIPANTS: &str = "All Participants";

/// Which member of the chart family is being driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Box/violin plots of one measure across visits
    #[default]
    ResultsOverTime,
    /// Participant lines across time with drill-down to all measures
    OutlierExplorer,
    /// Distribution of one measure with a record listing per bar
    Histogram,
    /// Baseline vs comparison scatter with brushing
    ShiftPlot,
}

impl ChartKind {
    /// Footnote under the detail table when nothing is selected
    pub fn default_footnote(&self) -> &'static str {
        match self {
            ChartKind::ResultsOverTime => "Click a box for details.",
            ChartKind::OutlierExplorer => {
                "Click a line or point to see all measures for a participant."
            }
            ChartKind::Histogram => "Click a bar for details.",
            ChartKind::ShiftPlot => "Click and drag to select points.",
        }
    }

    /// Whether measure values are plotted on the x axis
    pub fn values_on_x(&self) -> bool {
        matches!(self, ChartKind::Histogram)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::ResultsOverTime => "results over time",
            ChartKind::OutlierExplorer => "outlier explorer",
            ChartKind::Histogram => "histogram",
            ChartKind::ShiftPlot => "shift plot",
        };
        f.write_str(name)
    }
}

/// Column roles shared by every chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRoles {
    /// Participant identifier
    pub id_col: String,
    /// Measure (test) name
    pub measure_col: String,
    /// Numeric result
    pub value_col: String,
    /// Result unit
    pub unit_col: String,
    /// Lower limit of normal
    pub normal_col_low: String,
    /// Upper limit of normal
    pub normal_col_high: String,
}

impl Default for ColumnRoles {
    fn default() -> Self {
        Self {
            id_col: "USUBJID".to_string(),
            measure_col: "TEST".to_string(),
            value_col: "STRESN".to_string(),
            unit_col: "STRESU".to_string(),
            normal_col_low: "STNRLO".to_string(),
            normal_col_high: "STNRHI".to_string(),
        }
    }
}

/// Scale of a time axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeScale {
    /// Visits as ordered categories
    #[default]
    Ordinal,
    /// Study day or other numeric time
    Linear,
}

/// A column that can sit on the time axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeColumn {
    pub value_col: String,
    pub label: String,
    #[serde(default)]
    pub scale: TimeScale,
    /// Numeric column giving the visit sequence
    #[serde(default)]
    pub order_col: Option<String>,
    /// Explicit visit order; visits not listed follow in data order
    #[serde(default)]
    pub order: Vec<String>,
}

impl TimeColumn {
    /// Ordinal time column
    pub fn ordinal(value_col: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value_col: value_col.into(),
            label: label.into(),
            scale: TimeScale::Ordinal,
            order_col: None,
            order: Vec::new(),
        }
    }

    /// Linear time column
    pub fn linear(value_col: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            scale: TimeScale::Linear,
            ..Self::ordinal(value_col, label)
        }
    }

    /// Set the order column
    pub fn with_order_col(mut self, order_col: impl Into<String>) -> Self {
        self.order_col = Some(order_col.into());
        self
    }

    /// Set an explicit visit order
    pub fn with_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order = order.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for TimeColumn {
    fn default() -> Self {
        Self::ordinal("VISIT", "Visit").with_order_col("VISITNUM")
    }
}

/// A grouping offered in the group picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub value_col: String,
    pub label: String,
}

impl GroupDefinition {
    pub fn new(value_col: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value_col: value_col.into(),
            label: label.into(),
        }
    }

    /// The "no grouping" placeholder
    pub fn none() -> Self {
        Self::new(NO_GROUP, "None")
    }

    pub fn is_placeholder(&self) -> bool {
        self.value_col == NO_GROUP
    }
}

/// A column shown in detail listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailColumn {
    pub value_col: String,
    pub label: String,
}

impl DetailColumn {
    pub fn new(value_col: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value_col: value_col.into(),
            label: label.into(),
        }
    }
}

/// How the value axis picks its domain when the measure changes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "behavior", rename_all = "snake_case")]
pub enum AxisBehavior {
    /// Fit the extent of the measure's data
    #[default]
    Flex,
    /// Always start from a fixed domain
    Fixed { min: f64, max: f64 },
}

/// Statistic summarizing a participant's values over a visit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStat {
    #[default]
    Mean,
    Min,
    Max,
}

impl ShiftStat {
    /// Apply the statistic to a non-empty slice
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        match self {
            ShiftStat::Mean => vigil_stats::mean(values),
            ShiftStat::Min => vigil_stats::extent(values).map(|(lo, _)| lo),
            ShiftStat::Max => vigil_stats::extent(values).map(|(_, hi)| hi),
        }
    }
}

/// Baseline and comparison definitions for the shift plot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftSettings {
    pub baseline_stat: ShiftStat,
    pub comparison_stat: ShiftStat,
    /// Baseline visits; empty means the first visit
    pub baseline_visits: Vec<String>,
    /// Comparison visits; empty means every visit after the first
    pub comparison_visits: Vec<String>,
}

/// Plot area in pixels, used to map screen-space brushes to data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSize {
    pub width: f32,
    pub height: f32,
}

impl Default for PlotSize {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 400.0,
        }
    }
}

/// Host-supplied chart configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Chart family member
    pub chart: ChartKind,

    /// Column roles
    #[serde(flatten)]
    pub columns: ColumnRoles,

    /// Columns offered on the time axis; the first is the default
    pub time_cols: Vec<TimeColumn>,

    /// Measure shown first
    pub start_value: Option<String>,

    /// Subsetters
    pub filters: Vec<FilterDefinition>,

    /// Groupings offered in the group picker
    pub groups: Vec<GroupDefinition>,

    /// Grouping selected first
    pub color_by: Option<String>,

    /// Extra columns for detail listings
    pub details: Vec<DetailColumn>,

    /// Text tokens treated as missing results
    pub missing_values: Vec<String>,

    /// Keep visits with no data in the current subset on the axis
    pub visits_without_data: bool,

    /// Show unscheduled visits
    pub unscheduled_visits: bool,

    /// `/pattern/flags` identifying unscheduled visits
    pub unscheduled_visit_pattern: Option<String>,

    /// Explicit unscheduled visit labels; wins over the pattern
    pub unscheduled_visit_values: Option<Vec<String>>,

    /// Draw box plots
    pub box_plots: bool,

    /// Draw violins
    pub violins: bool,

    /// Draw normal-range bands
    pub normal_range: bool,

    /// Bins per violin silhouette
    pub violin_bins: usize,

    /// Bars in the histogram
    pub histogram_bins: usize,

    /// Value-axis domain behavior
    pub value_axis: AxisBehavior,

    /// Shift-plot visit sets and statistics
    pub shift: ShiftSettings,

    /// Noun used in the population annotation
    pub population_unit: String,

    /// Plot area size
    pub plot: PlotSize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            chart: ChartKind::default(),
            columns: ColumnRoles::default(),
            time_cols: Vec::new(),
            start_value: None,
            filters: Vec::new(),
            groups: Vec::new(),
            color_by: None,
            details: Vec::new(),
            missing_values: default_missing_values(),
            visits_without_data: false,
            unscheduled_visits: false,
            unscheduled_visit_pattern: Some("/unscheduled|early termination/i".to_string()),
            unscheduled_visit_values: None,
            box_plots: true,
            violins: false,
            normal_range: true,
            violin_bins: vigil_stats::DEFAULT_VIOLIN_BINS,
            histogram_bins: 25,
            value_axis: AxisBehavior::Flex,
            shift: ShiftSettings::default(),
            population_unit: "participant".to_string(),
            plot: PlotSize::default(),
        }
    }
}

impl ChartSettings {
    /// Default settings for a chart kind
    pub fn for_chart(chart: ChartKind) -> Self {
        Self {
            chart,
            ..Self::default()
        }
    }

    /// Load settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize settings to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate settings
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("id_col", &self.columns.id_col),
            ("measure_col", &self.columns.measure_col),
            ("value_col", &self.columns.value_col),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name.to_string()));
            }
        }

        if self.violin_bins == 0 {
            return Err(ConfigError::OutOfRange(
                "violin_bins must be positive".to_string(),
            ));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigError::OutOfRange(
                "histogram_bins must be positive".to_string(),
            ));
        }

        if let AxisBehavior::Fixed { min, max } = self.value_axis {
            if !min.is_finite() || !max.is_finite() || min >= max {
                return Err(ConfigError::OutOfRange(format!(
                    "fixed value axis needs finite min < max, got [{}, {}]",
                    min, max
                )));
            }
        }

        if !(self.plot.width > 0.0 && self.plot.height > 0.0) {
            return Err(ConfigError::OutOfRange(
                "plot width and height must be positive".to_string(),
            ));
        }

        if let Some(pattern) = &self.unscheduled_visit_pattern {
            compile_pattern(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
        }

        Ok(())
    }

    /// Validate and derive the settings the pipeline reads
    pub fn resolve(&self) -> ConfigResult<ResolvedSettings> {
        self.validate()?;

        let time_cols = if self.time_cols.is_empty() {
            default_time_cols(self.chart)
        } else {
            self.time_cols.clone()
        };

        let mut groups = vec![GroupDefinition::none()];
        groups.extend(
            self.groups
                .iter()
                .filter(|g| !g.is_placeholder())
                .cloned(),
        );

        let values = self
            .unscheduled_visit_values
            .as_ref()
            .map(|v| v.iter().cloned().collect::<HashSet<_>>());
        let pattern = match (&values, &self.unscheduled_visit_pattern) {
            (None, Some(p)) => Some(compile_pattern(p).map_err(|e| {
                ConfigError::InvalidPattern {
                    pattern: p.clone(),
                    message: e.to_string(),
                }
            })?),
            _ => None,
        };

        Ok(ResolvedSettings {
            chart: self.chart,
            columns: self.columns.clone(),
            time_cols,
            start_value: self.start_value.clone(),
            filters: self.filters.clone(),
            groups,
            color_by: self.color_by.clone(),
            details: self.merged_details(),
            missing_values: self.missing_values.clone(),
            unscheduled: UnscheduledVisits { values, pattern },
            toggles: Toggles {
                normal_range: self.normal_range,
                box_plots: self.box_plots,
                violins: self.violins,
                visits_without_data: self.visits_without_data,
                unscheduled_visits: self.unscheduled_visits,
            },
            violin_bins: self.violin_bins,
            histogram_bins: self.histogram_bins,
            value_axis: self.value_axis,
            shift: self.shift.clone(),
            population_unit: self.population_unit.clone(),
            plot: self.plot,
        })
    }

    /// Detail columns for the chart kind, user columns appended without duplicates
    fn merged_details(&self) -> Vec<DetailColumn> {
        let c = &self.columns;
        let mut details = match self.chart {
            ChartKind::Histogram => {
                let mut d = vec![DetailColumn::new(&c.id_col, "Subject Identifier")];
                d.extend(
                    self.filters
                        .iter()
                        .map(|f| DetailColumn::new(&f.value_col, &f.label)),
                );
                d.push(DetailColumn::new(&c.value_col, "Result"));
                d.push(DetailColumn::new(&c.normal_col_low, "Lower Limit of Normal"));
                d.push(DetailColumn::new(&c.normal_col_high, "Upper Limit of Normal"));
                d
            }
            ChartKind::OutlierExplorer if self.details.is_empty() => vec![
                DetailColumn::new("AGE", "Age"),
                DetailColumn::new("SEX", "Sex"),
                DetailColumn::new("RACE", "Race"),
            ],
            ChartKind::OutlierExplorer | ChartKind::ShiftPlot => Vec::new(),
            ChartKind::ResultsOverTime => vec![
                DetailColumn::new(&c.id_col, "Participant"),
                DetailColumn::new(&c.value_col, "Result"),
            ],
        };

        for detail in &self.details {
            if !details.iter().any(|d| d.value_col == detail.value_col) {
                details.push(detail.clone());
            }
        }
        details
    }
}

fn default_time_cols(chart: ChartKind) -> Vec<TimeColumn> {
    match chart {
        ChartKind::OutlierExplorer => vec![
            TimeColumn::default(),
            TimeColumn::linear("DY", "Study Day"),
        ],
        _ => vec![TimeColumn::default()],
    }
}

/// Compile a `/body/flags` pattern; strings without slashes are used as-is
///
/// The `i`, `m` and `s` flags map to inline regex flags; others are ignored.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let split = pattern
        .strip_prefix('/')
        .and_then(|rest| rest.rfind('/').map(|i| (&rest[..i], &rest[i + 1..])));
    let (body, flags) = split.unwrap_or((pattern, ""));

    let inline: String = flags
        .chars()
        .filter(|c| matches!(c, 'i' | 'm' | 's'))
        .collect();
    if inline.is_empty() {
        Regex::new(body)
    } else {
        Regex::new(&format!("(?{}){}", inline, body))
    }
}

/// Identifies unscheduled visits by explicit label or pattern
#[derive(Debug, Clone, Default)]
pub struct UnscheduledVisits {
    values: Option<HashSet<String>>,
    pattern: Option<Regex>,
}

impl UnscheduledVisits {
    /// Whether a visit label denotes an unscheduled visit
    pub fn is_unscheduled(&self, visit: &str) -> bool {
        match (&self.values, &self.pattern) {
            (Some(values), _) => values.contains(visit),
            (None, Some(pattern)) => pattern.is_match(visit),
            (None, None) => false,
        }
    }

    /// Whether any rule is configured
    pub fn is_configured(&self) -> bool {
        self.values.is_some() || self.pattern.is_some()
    }
}

/// Settings after validation and derivation
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub chart: ChartKind,
    pub columns: ColumnRoles,
    /// Never empty
    pub time_cols: Vec<TimeColumn>,
    pub start_value: Option<String>,
    pub filters: Vec<FilterDefinition>,
    /// Placeholder first, then configured groupings
    pub groups: Vec<GroupDefinition>,
    pub color_by: Option<String>,
    pub details: Vec<DetailColumn>,
    pub missing_values: Vec<String>,
    pub unscheduled: UnscheduledVisits,
    /// Initial toggle values
    pub toggles: Toggles,
    pub violin_bins: usize,
    pub histogram_bins: usize,
    pub value_axis: AxisBehavior,
    pub shift: ShiftSettings,
    pub population_unit: String,
    pub plot: PlotSize,
}

impl ResolvedSettings {
    /// Time column by name
    pub fn time_col(&self, column: &str) -> Option<&TimeColumn> {
        self.time_cols.iter().find(|t| t.value_col == column)
    }

    /// Grouping by column
    pub fn group(&self, column: &str) -> Option<&GroupDefinition> {
        self.groups.iter().find(|g| g.value_col == column)
    }
}
