//! Chart-kind scenarios
//!
//! Each chart kind driven through construction, control changes and
//! selection against the shared lab fixture.

mod common;

use common::{chart, settings};
use rstest::rstest;
use vigil_core::{
    AxisDomain, Chart, ChartKind, ControlEvent, Mark, Orientation, Position, RecordingAdapter,
    SelectionCriterion, ALL_PARTICIPANTS, NO_GROUP,
};
use vigil_data::{Dataset, DiagnosticKind, Record};
use vigil_filter::{BrushExtent, Selection, Toggle};

fn categories(domain: &AxisDomain) -> Vec<&str> {
    domain
        .categories()
        .unwrap_or_default()
        .iter()
        .map(String::as_str)
        .collect()
}

fn sex(level: &str) -> ControlEvent {
    ControlEvent::SetFilter {
        column: "SEX".into(),
        selection: Selection::One(level.into()),
    }
}

// === Shared behavior ===

#[rstest]
#[case(ChartKind::ResultsOverTime)]
#[case(ChartKind::OutlierExplorer)]
#[case(ChartKind::Histogram)]
#[case(ChartKind::ShiftPlot)]
fn test_initial_frame(#[case] kind: ChartKind) {
    let chart = chart(kind);
    let frame = chart.frame();

    assert_eq!(frame.chart, kind);
    assert_eq!(frame.measure.as_deref(), Some("ALT"));
    assert_eq!(frame.population.shown, 4);
    assert_eq!(frame.population.text, "4 of 4 participant(s) shown (100.0%)");
    assert_eq!(chart.detail().footnote, kind.default_footnote());
    assert!(chart.state().value_domain.min < chart.state().value_domain.max);
}

#[rstest]
#[case(ChartKind::ResultsOverTime)]
#[case(ChartKind::OutlierExplorer)]
#[case(ChartKind::Histogram)]
fn test_filter_narrows_population(#[case] kind: ChartKind) {
    let mut chart = chart(kind);
    chart.handle(sex("F")).unwrap();
    assert_eq!(chart.frame().population.shown, 2);
    assert_eq!(chart.frame().population.total, 4);

    chart.handle(ControlEvent::ResetFilters).unwrap();
    assert_eq!(chart.frame().population.shown, 4);
}

#[test]
fn test_frame_serializes() {
    let chart = chart(ChartKind::ResultsOverTime);
    let json = chart.frame().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["chart"], "results_over_time");
    assert_eq!(value["x_axis"]["domain"]["type"], "ordinal");
}

// === Results over time ===

#[test]
fn test_results_over_time_axes() {
    let mut chart = chart(ChartKind::ResultsOverTime);
    let frame = chart.frame();
    assert_eq!(categories(&frame.x_axis.domain), vec!["Screening", "Week 2", "Week 4"]);
    assert_eq!(frame.y_axis.label, "ALT (U/L)");
    assert_eq!(frame.overlays.len(), 3);
    assert!(frame.overlays.iter().all(|o| o.group == ALL_PARTICIPANTS));
    assert!(frame.legend.is_none());

    chart
        .handle(ControlEvent::SetToggle {
            toggle: Toggle::UnscheduledVisits,
            value: true,
        })
        .unwrap();
    assert_eq!(
        categories(&chart.frame().x_axis.domain),
        vec!["Screening", "Week 2", "Week 4", "Unscheduled 1"]
    );
    assert_eq!(chart.state().value_domain.as_tuple(), (10.0, 46.0));
}

#[test]
fn test_results_over_time_groups() {
    let mut chart = chart(ChartKind::ResultsOverTime);
    chart.handle(ControlEvent::SetGroup { group: "ARM".into() }).unwrap();

    let frame = chart.frame();
    let legend = frame.legend.as_ref().unwrap();
    assert_eq!(legend.entries, vec!["Drug", "Placebo"]);
    assert_eq!(frame.overlays.len(), 6);

    let at_week_2: Vec<_> = frame
        .overlays
        .iter()
        .filter(|o| o.position == Some(Position::Category("Week 2".into())))
        .collect();
    assert_eq!(at_week_2.len(), 2);
    assert!(at_week_2[0].offset < 0.0);
    assert!((at_week_2[0].offset + at_week_2[1].offset).abs() < 1e-4);
    assert_eq!(at_week_2[0].width, at_week_2[1].width);
}

#[test]
fn test_results_over_time_box_selection() {
    let mut chart = chart(ChartKind::ResultsOverTime);
    chart.handle(ControlEvent::SetGroup { group: "ARM".into() }).unwrap();
    chart
        .select(SelectionCriterion::Box {
            visit: "Week 2".into(),
            group: "Drug".into(),
        })
        .unwrap();

    let detail = chart.detail();
    assert_eq!(
        detail.footnote,
        "Table displays 2 records at Week 2 for Drug. Click outside a box to remove details."
    );
    let table = detail.table.as_ref().unwrap();
    assert_eq!(table.headers, vec!["Participant", "Result"]);
    assert_eq!(table.rows, vec![vec!["03", "32"], vec!["04", "42"]]);

    chart.clear_selection().unwrap();
    assert!(!chart.detail().is_active());
    assert_eq!(chart.state().cycles, 2);
}

#[test]
fn test_box_selection_cleared_by_regrouping() {
    let mut chart = chart(ChartKind::ResultsOverTime);
    chart.handle(ControlEvent::SetGroup { group: "ARM".into() }).unwrap();
    chart
        .select(SelectionCriterion::Box {
            visit: "Week 2".into(),
            group: "Drug".into(),
        })
        .unwrap();
    assert!(chart.detail().is_active());

    // same grouping again keeps the box
    chart.handle(ControlEvent::SetGroup { group: "ARM".into() }).unwrap();
    assert!(chart.detail().is_active());

    chart.handle(ControlEvent::SetGroup { group: NO_GROUP.into() }).unwrap();
    assert!(chart.state().selection.is_none());
    assert!(!chart.detail().is_active());
}

// === Outlier explorer ===

#[test]
fn test_outlier_explorer_marks() {
    let chart = chart(ChartKind::OutlierExplorer);
    let marks = &chart.frame().marks;

    let lines: Vec<_> = marks
        .iter()
        .filter_map(|m| match m {
            Mark::Line {
                participant, points, ..
            } => Some((participant.as_str(), points)),
            _ => None,
        })
        .collect();
    assert_eq!(lines.len(), 4);
    let (_, first) = lines.iter().find(|(p, _)| *p == "01").unwrap();
    assert_eq!(
        first.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
        vec![10.0, 12.0, 14.0]
    );

    let abnormal = marks
        .iter()
        .filter(|m| matches!(m, Mark::Point { abnormal: true, .. }))
        .count();
    assert_eq!(abnormal, 2);

    let overlays = &chart.frame().overlays;
    assert_eq!(overlays.len(), 1);
    assert_eq!(overlays[0].position, None);
}

#[test]
fn test_outlier_explorer_study_day_axis() {
    let mut chart = chart(ChartKind::OutlierExplorer);
    chart
        .handle(ControlEvent::SetTimeColumn { column: "DY".into() })
        .unwrap();

    let frame = chart.frame();
    assert_eq!(frame.x_axis.label, "Study Day");
    assert_eq!(frame.x_axis.domain.as_linear().map(|d| d.as_tuple()), Some((1.0, 29.0)));
    assert!(frame
        .marks
        .iter()
        .all(|m| !matches!(m, Mark::Point { x: Position::Category(_), .. })));
}

#[test]
fn test_outlier_explorer_participant_drilldown() {
    let mut chart = chart(ChartKind::OutlierExplorer);
    chart
        .select(SelectionCriterion::Participant { id: "03".into() })
        .unwrap();

    let multiples = chart.detail().small_multiples.as_ref().unwrap();
    assert_eq!(multiples.header, "All Measures for 03");
    assert_eq!(multiples.details, vec![("Sex".to_string(), "F".to_string())]);
    let measures: Vec<&str> = multiples.panels.iter().map(|p| p.measure.as_str()).collect();
    assert_eq!(measures, vec!["ALT", "AST"]);

    let selected: Vec<&str> = chart
        .frame()
        .marks
        .iter()
        .filter_map(|m| match m {
            Mark::Line {
                participant,
                selected: true,
                ..
            } => Some(participant.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(selected, vec!["03"]);
}

// === Histogram ===

#[test]
fn test_histogram_bins_and_normal_range() {
    let chart = chart(ChartKind::Histogram);
    let frame = chart.frame();

    assert_eq!(frame.bars.len(), 25);
    assert_eq!(frame.bars.iter().map(|b| b.count).sum::<usize>(), 12);
    assert_eq!(frame.y_axis.label, "# of Observations");
    assert_eq!(frame.x_axis.label, "ALT (U/L)");
    assert!(frame.legend.is_none());

    assert_eq!(frame.normal_ranges.len(), 1);
    let band = &frame.normal_ranges[0];
    assert_eq!((band.range.low, band.range.high), (10.0, 40.0));

    assert_eq!(frame.overlays.len(), 1);
    assert_eq!(frame.overlays[0].orientation, Orientation::Horizontal);
}

#[test]
fn test_histogram_limits_restrict_data() {
    let mut chart = chart(ChartKind::Histogram);
    chart.handle(ControlEvent::SetUpperLimit { value: 30.0 }).unwrap();

    let frame = chart.frame();
    assert_eq!(frame.bars.iter().map(|b| b.count).sum::<usize>(), 7);
    assert_eq!(frame.population.shown, 3);
}

#[test]
fn test_histogram_bin_selection_lifecycle() {
    let mut chart = chart(ChartKind::Histogram);
    chart.select(SelectionCriterion::Bin { index: 0 }).unwrap();

    assert!(chart
        .detail()
        .footnote
        .starts_with("Table displays 1 records with ALT values from 10.000 to 11.360 U/L."));
    assert_eq!(chart.detail().table.as_ref().map(|t| t.len()), Some(1));
    assert!(chart.frame().bars[0].selected);
    assert!(!chart.frame().bars[1].selected);

    // filter change keeps the selection and recomputes it
    chart.handle(sex("M")).unwrap();
    assert!(chart.detail().is_active());
    assert_eq!(chart.detail().table.as_ref().map(|t| t.len()), Some(0));

    chart
        .handle(ControlEvent::SetMeasure {
            measure: "AST".into(),
        })
        .unwrap();
    assert!(!chart.detail().is_active());
    assert_eq!(chart.detail().footnote, "Click a bar for details.");
    assert!(chart.frame().bars.iter().all(|b| !b.selected));
}

#[test]
fn test_histogram_without_normal_range() {
    let dataset = Dataset::new(
        [("01", 5.0), ("02", 7.0), ("03", 9.0)]
            .into_iter()
            .map(|(id, v)| {
                Record::new()
                    .with("USUBJID", id)
                    .with("TEST", "Glucose")
                    .with("STRESN", v)
                    .with("VISIT", "Screening")
            })
            .collect(),
    );
    let chart = Chart::new(
        &dataset,
        &vigil_core::ChartSettings::for_chart(ChartKind::Histogram),
        RecordingAdapter::new(),
    )
    .unwrap();

    assert!(chart.diagnostics().iter().any(|d| d.kind
        == DiagnosticKind::NoNormalRange {
            measure: "Glucose".into()
        }));
    assert!(chart.frame().normal_ranges.is_empty());
    let toggle = chart.frame().controls.toggle(Toggle::NormalRange).unwrap();
    assert!(!toggle.enabled);
}

// === Shift plot ===

#[test]
fn test_shift_plot_points() {
    let chart = chart(ChartKind::ShiftPlot);
    let state = chart.state();

    let points: Vec<(f64, f64)> = state
        .shift_points
        .iter()
        .map(|p| (p.baseline, p.comparison))
        .collect();
    assert_eq!(points, vec![(10.0, 13.0), (20.0, 23.0), (30.0, 33.0), (40.0, 43.0)]);
    assert_eq!(state.value_domain.as_tuple(), (10.0, 43.0));

    let frame = chart.frame();
    assert_eq!(frame.x_axis.label, "Baseline ALT (U/L)");
    assert_eq!(frame.y_axis.label, "Comparison ALT (U/L)");
    let line = frame.reference_line.as_ref().unwrap();
    assert_eq!((line.from, line.to), ((10.0, 10.0), (43.0, 43.0)));
    assert_eq!(frame.marks.len(), 4);
}

#[test]
fn test_shift_plot_visit_sets() {
    let mut chart = chart(ChartKind::ShiftPlot);
    chart
        .handle_all(vec![
            ControlEvent::SetBaselineVisits {
                visits: vec!["Week 2".into()],
            },
            ControlEvent::SetComparisonVisits {
                visits: vec!["Week 4".into()],
            },
        ]);

    let changes: Vec<f64> = chart.state().shift_points.iter().map(|p| p.change).collect();
    assert_eq!(changes, vec![2.0, 2.0, 2.0, 2.0]);
    let visits = chart.frame().controls.visits.as_ref().unwrap();
    assert_eq!(visits.baseline, vec!["Week 2"]);
}

#[test]
fn test_shift_plot_brush() {
    let mut chart = chart(ChartKind::ShiftPlot);
    chart
        .select(SelectionCriterion::Brush {
            extent: BrushExtent::new((5.0, 25.0), (0.0, 100.0)),
        })
        .unwrap();

    let detail = chart.detail();
    assert_eq!(detail.footnote, "Details of 2 selected points:");
    let table = detail.table.as_ref().unwrap();
    assert_eq!(table.headers[..5], ["Subject ID", "Baseline Value", "Comparison Value", "Change", "Percent Change"]);
    assert_eq!(table.rows[0][0], "01");
    assert_eq!(table.rows[0][4], "30%");
    assert_eq!(chart.state().store.brush(), Some(BrushExtent::new((5.0, 25.0), (0.0, 100.0))));
}

#[test]
fn test_shift_plot_screen_brush() {
    let mut chart = chart(ChartKind::ShiftPlot);
    // left half of the default 640x400 plot area, full height
    chart
        .select(SelectionCriterion::ScreenBrush {
            x: (0.0, 320.0),
            y: (0.0, 400.0),
        })
        .unwrap();

    let detail = chart.detail();
    assert!(matches!(detail.selection, Some(SelectionCriterion::Brush { .. })));
    assert_eq!(detail.table.as_ref().map(|t| t.len()), Some(2));
}
