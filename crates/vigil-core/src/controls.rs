//! Control panel description
//!
//! Published by the layout stage and refreshed on every preprocess so each
//! control shows the current store value. Controls never act by themselves;
//! hosts turn user input into [`crate::events::ControlEvent`]s.

use serde::{Deserialize, Serialize};

use vigil_filter::{FilterStore, Selection, Toggle};

use crate::config::{ChartKind, GroupDefinition, ResolvedSettings};

/// A drop-down
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectControl {
    pub label: String,
    /// `(value, label)` pairs
    pub options: Vec<(String, String)>,
    pub value: Option<String>,
    pub visible: bool,
}

/// A subsetter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetterControl {
    pub column: String,
    pub label: String,
    pub levels: Vec<String>,
    pub multiple: bool,
    pub selection: Selection,
}

/// Lower and upper value-axis inputs with a reset button
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitControl {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    /// Whether reset would change anything
    pub reset_enabled: bool,
}

/// A checkbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleControl {
    pub toggle: Toggle,
    pub label: String,
    pub value: bool,
    pub enabled: bool,
    pub visible: bool,
}

/// Baseline and comparison visit pickers of the shift plot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitSetControl {
    pub options: Vec<String>,
    pub baseline: Vec<String>,
    pub comparison: Vec<String>,
}

/// Every control the chart offers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPanel {
    pub measure: SelectControl,
    pub subsetters: Vec<SubsetterControl>,
    pub group: SelectControl,
    pub time: SelectControl,
    pub limits: LimitControl,
    pub toggles: Vec<ToggleControl>,
    pub visits: Option<VisitSetControl>,
}

/// Inputs that change between cycles
pub struct PanelInputs<'a> {
    pub measures: &'a [String],
    pub groups: &'a [GroupDefinition],
    pub visits: &'a [String],
    pub has_normal_range: bool,
    pub reset_enabled: bool,
}

impl ControlPanel {
    pub fn build(settings: &ResolvedSettings, store: &FilterStore, inputs: PanelInputs<'_>) -> Self {
        let measure = SelectControl {
            label: "Measure".to_string(),
            options: inputs
                .measures
                .iter()
                .map(|m| (m.clone(), m.clone()))
                .collect(),
            value: store.measure().map(str::to_string),
            visible: true,
        };

        let subsetters = store
            .filters()
            .iter()
            .map(|f| SubsetterControl {
                column: f.column.clone(),
                label: f.label.clone(),
                levels: f.levels.clone(),
                multiple: f.multiple,
                selection: f.selection.clone(),
            })
            .collect();

        let group = SelectControl {
            label: "Group".to_string(),
            options: inputs
                .groups
                .iter()
                .map(|g| (g.value_col.clone(), g.label.clone()))
                .collect(),
            value: store.group().map(str::to_string),
            visible: settings.chart != ChartKind::Histogram && inputs.groups.len() > 1,
        };

        let time = SelectControl {
            label: "X-axis".to_string(),
            options: settings
                .time_cols
                .iter()
                .map(|t| (t.value_col.clone(), t.label.clone()))
                .collect(),
            value: store.time_column().map(str::to_string),
            visible: settings.time_cols.len() > 1,
        };

        let limits = LimitControl {
            lower: store.limits().lower,
            upper: store.limits().upper,
            reset_enabled: inputs.reset_enabled,
        };

        let toggles = toggles_for(settings, store, inputs.has_normal_range);

        let visits = (settings.chart == ChartKind::ShiftPlot).then(|| VisitSetControl {
            options: inputs.visits.to_vec(),
            baseline: store.baseline_visits().to_vec(),
            comparison: store.comparison_visits().to_vec(),
        });

        Self {
            measure,
            subsetters,
            group,
            time,
            limits,
            toggles,
            visits,
        }
    }

    /// Control for a toggle, if offered
    pub fn toggle(&self, toggle: Toggle) -> Option<&ToggleControl> {
        self.toggles.iter().find(|t| t.toggle == toggle)
    }
}

fn toggles_for(
    settings: &ResolvedSettings,
    store: &FilterStore,
    has_normal_range: bool,
) -> Vec<ToggleControl> {
    let offered: &[Toggle] = match settings.chart {
        ChartKind::ResultsOverTime => &[
            Toggle::BoxPlots,
            Toggle::Violins,
            Toggle::VisitsWithoutData,
            Toggle::UnscheduledVisits,
        ],
        ChartKind::OutlierExplorer => &[Toggle::VisitsWithoutData, Toggle::UnscheduledVisits],
        ChartKind::Histogram => &[Toggle::NormalRange, Toggle::BoxPlots],
        ChartKind::ShiftPlot => &[Toggle::BoxPlots],
    };

    let values = store.toggles();
    offered
        .iter()
        .map(|&toggle| {
            let (label, enabled, visible) = match toggle {
                Toggle::NormalRange => ("Normal range", has_normal_range, true),
                Toggle::BoxPlots => ("Box plots", true, true),
                Toggle::Violins => ("Violin plots", true, true),
                Toggle::VisitsWithoutData => ("Visits without data", true, true),
                Toggle::UnscheduledVisits => {
                    ("Unscheduled visits", true, settings.unscheduled.is_configured())
                }
            };
            ToggleControl {
                toggle,
                label: label.to_string(),
                value: values.get(toggle) && enabled,
                enabled,
                visible,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartSettings;
    use vigil_filter::{Filter, Toggles};

    fn panel(settings: &ChartSettings, has_normal_range: bool) -> ControlPanel {
        let resolved = settings.resolve().unwrap();
        let mut store = FilterStore::new(
            vec![Filter::new("SEX", "Sex", vec!["F".into(), "M".into()])],
            Toggles::default(),
        );
        store.set_measure("ALT");
        let measures = vec!["ALT".to_string(), "AST".to_string()];
        let groups = resolved.groups.clone();
        ControlPanel::build(
            &resolved,
            &store,
            PanelInputs {
                measures: &measures,
                groups: &groups,
                visits: &[],
                has_normal_range,
                reset_enabled: false,
            },
        )
    }

    #[test]
    fn test_results_over_time_panel() {
        let p = panel(&ChartSettings::default(), true);

        assert_eq!(p.measure.value.as_deref(), Some("ALT"));
        assert_eq!(p.measure.options.len(), 2);
        assert_eq!(p.subsetters.len(), 1);
        assert!(!p.group.visible);
        assert!(!p.time.visible);
        assert!(p.toggle(Toggle::Violins).is_some());
        assert!(p.toggle(Toggle::UnscheduledVisits).unwrap().visible);
        assert!(p.visits.is_none());
    }

    #[test]
    fn test_histogram_normal_range_disabled_without_data() {
        let settings = ChartSettings::for_chart(ChartKind::Histogram);
        let p = panel(&settings, false);

        let normal = p.toggle(Toggle::NormalRange).unwrap();
        assert!(!normal.enabled);
        assert!(!normal.value);
        assert!(p.toggle(Toggle::Violins).is_none());
    }

    #[test]
    fn test_unscheduled_toggle_hidden_without_rule() {
        let settings = ChartSettings {
            unscheduled_visit_pattern: None,
            ..ChartSettings::default()
        };
        let p = panel(&settings, true);
        assert!(!p.toggle(Toggle::UnscheduledVisits).unwrap().visible);
    }
}
