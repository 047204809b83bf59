//! Lifecycle controller
//!
//! A [`Chart`] owns the state, the registered hooks and the rendering
//! adapter. Construction runs init and layout followed by the first draw
//! cycle. Each control event then triggers the least work that keeps the
//! output consistent:
//!
//! - store changes rerun the whole cycle
//! - a resize reruns only the resize stage
//! - selections recompute the detail view against the current derived data
//!
//! Events queued while a cycle runs are applied as one batch after it
//! finishes, followed by a single follow-up cycle.

use vigil_data::{Dataset, Diagnostic, DiagnosticKind, Diagnostics};
use vigil_filter::AxisLimits;

use crate::adapter::RenderAdapter;
use crate::config::{ChartSettings, PlotSize};
use crate::detail::{DetailView, SelectionCriterion};
use crate::error::{ConfigError, VigilError, VigilResult};
use crate::events::{ControlEvent, ControlQueue, MAX_FOLLOW_UP_CYCLES};
use crate::frame::RenderFrame;
use crate::hooks::{HookRegistry, Stage, StageHooks};
use crate::state::ChartState;

/// Work an applied event requires, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Effect {
    None,
    Detail,
    Resize,
    Full,
}

/// One chart instance bound to a rendering adapter
pub struct Chart<A: RenderAdapter> {
    state: ChartState,
    adapter: A,
    hooks: HookRegistry,
    queue: ControlQueue,
    diagnostics: Diagnostics,
}

impl<A: RenderAdapter> Chart<A> {
    /// Build and draw a chart
    pub fn new(dataset: &Dataset, settings: &ChartSettings, adapter: A) -> VigilResult<Self> {
        Self::with_hooks(dataset, settings, adapter, HookRegistry::new())
    }

    /// Build and draw a chart with hooks registered before init
    pub fn with_hooks(
        dataset: &Dataset,
        settings: &ChartSettings,
        adapter: A,
        hooks: HookRegistry,
    ) -> VigilResult<Self> {
        let resolved = settings.resolve()?;
        let mut diagnostics = Diagnostics::new();
        let state = ChartState::init(dataset, resolved, &mut diagnostics);
        tracing::info!(
            "{} chart initialized with {} records, {} measures",
            state.settings.chart,
            state.data.records.len(),
            state.data.measures.len()
        );

        let mut chart = Self {
            state,
            adapter,
            hooks,
            queue: ControlQueue::new(),
            diagnostics,
        };
        chart.hooks.run(Stage::Init, &chart.state, &mut chart.queue);
        chart.state.layout();
        chart.hooks.run(Stage::Layout, &chart.state, &mut chart.queue);
        chart.run_cycle();
        chart.settle();
        Ok(chart)
    }

    /// Register a hook; replaces a hook with the same id
    pub fn register_hook(&mut self, hook: Box<dyn StageHooks>) {
        self.hooks.register(hook);
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    /// Apply one control event and redraw as needed
    ///
    /// Invalid events are rejected without touching the chart.
    pub fn handle(&mut self, event: ControlEvent) -> VigilResult<()> {
        let effect = self.apply_event(event)?;
        self.render(effect);
        self.settle();
        Ok(())
    }

    /// Apply several events as one batch with a single redraw
    ///
    /// Invalid events in the batch are logged and skipped.
    pub fn handle_all<I>(&mut self, events: I)
    where
        I: IntoIterator<Item = ControlEvent>,
    {
        for event in events {
            self.queue.push(event);
        }
        self.settle();
    }

    /// Select marks and show their details
    pub fn select(&mut self, criterion: SelectionCriterion) -> VigilResult<()> {
        self.handle(ControlEvent::Select { criterion })
    }

    pub fn clear_selection(&mut self) -> VigilResult<()> {
        self.handle(ControlEvent::ClearSelection)
    }

    /// Change the plot size
    pub fn resize(&mut self, width: f32, height: f32) -> VigilResult<()> {
        self.handle(ControlEvent::Resize { width, height })
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    /// Frame from the latest cycle
    pub fn frame(&self) -> &RenderFrame {
        &self.state.frame
    }

    pub fn detail(&self) -> &DetailView {
        &self.state.detail
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.entries()
    }

    /// Take the diagnostics collected so far
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Validate an event and write it into the state
    fn apply_event(&mut self, event: ControlEvent) -> VigilResult<Effect> {
        tracing::debug!("applying {:?}", event);
        let state = &mut self.state;
        let effect = match event {
            ControlEvent::SetMeasure { measure } => {
                let Some(name) = state.data.measure(&measure).map(str::to_string) else {
                    return Err(VigilError::UnknownMeasure(measure));
                };
                // unset limits are refilled from the new measure's extent
                if state.store.measure() != Some(name.as_str()) {
                    state.store.set_limits(AxisLimits::default());
                }
                state.store.set_measure(name);
                Effect::Full
            }
            ControlEvent::SetFilter { column, selection } => {
                state.store.set_filter(&column, selection)?;
                Effect::Full
            }
            ControlEvent::ResetFilters => {
                state.store.reset_filters();
                Effect::Full
            }
            ControlEvent::SetGroup { group } => {
                if !state.groups.iter().any(|g| g.value_col == group) {
                    return Err(VigilError::UnknownGroup(group));
                }
                if state.group().map(|g| g.value_col.as_str()) != Some(group.as_str()) {
                    // box keys name groups of the old grouping
                    state.clear_selection();
                }
                state.store.set_group(group);
                Effect::Full
            }
            ControlEvent::SetTimeColumn { column } => {
                if state.settings.time_col(&column).is_none() {
                    return Err(VigilError::UnknownTimeColumn(column));
                }
                state.store.set_time_column(column);
                Effect::Full
            }
            ControlEvent::SetToggle { toggle, value } => {
                state.store.set_toggle(toggle, value);
                Effect::Full
            }
            ControlEvent::SetLowerLimit { value } => {
                finite_limit("lower", value)?;
                state.store.set_lower_limit(value);
                Effect::Full
            }
            ControlEvent::SetUpperLimit { value } => {
                finite_limit("upper", value)?;
                state.store.set_upper_limit(value);
                Effect::Full
            }
            ControlEvent::ResetLimits => {
                state.store.set_limits(AxisLimits::default());
                Effect::Full
            }
            ControlEvent::SetBaselineVisits { visits } => {
                state.store.set_baseline_visits(visits);
                Effect::Full
            }
            ControlEvent::SetComparisonVisits { visits } => {
                state.store.set_comparison_visits(visits);
                Effect::Full
            }
            ControlEvent::Resize { width, height } => {
                if !(width > 0.0 && height > 0.0) {
                    return Err(ConfigError::OutOfRange(format!(
                        "plot size must be positive, got {}x{}",
                        width, height
                    ))
                    .into());
                }
                state.settings.plot = PlotSize { width, height };
                Effect::Resize
            }
            ControlEvent::Select { criterion } => {
                if !criterion.supported_by(state.settings.chart) {
                    return Err(VigilError::UnsupportedSelection(format!(
                        "{:?} on a {} chart",
                        criterion, state.settings.chart
                    )));
                }
                let criterion = match criterion {
                    SelectionCriterion::ScreenBrush { x, y } => SelectionCriterion::Brush {
                        extent: state.screen_brush(x, y),
                    },
                    other => other,
                };
                if let SelectionCriterion::Brush { extent } = &criterion {
                    state.store.set_brush(Some(*extent));
                }
                state.detail = state.detail_for(&criterion);
                state.selection = Some(criterion.clone());

                if let SelectionCriterion::Participant { id } = &criterion {
                    self.hooks
                        .participant_selected(id, &self.state, &mut self.queue);
                    self.adapter.participant_selected(id);
                }
                Effect::Detail
            }
            ControlEvent::ClearSelection => {
                state.clear_selection();
                Effect::Detail
            }
        };
        Ok(effect)
    }

    fn render(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Detail => {
                self.state.mark_selection();
                self.adapter.draw(&self.state.frame, &mut self.queue);
                self.adapter.draw_detail(&self.state.detail);
            }
            Effect::Resize => {
                self.state.resize();
                self.hooks.run(Stage::Resize, &self.state, &mut self.queue);
                self.adapter.draw(&self.state.frame, &mut self.queue);
            }
            Effect::Full => self.run_cycle(),
        }
    }

    /// One full draw cycle
    fn run_cycle(&mut self) {
        for stage in Stage::CYCLE {
            match stage {
                Stage::Preprocess => self.state.preprocess(&mut self.diagnostics),
                Stage::Datatransform => self.state.datatransform(&mut self.diagnostics),
                Stage::Draw => self.state.draw(),
                Stage::Resize => self.state.resize(),
                Stage::Init | Stage::Layout => {}
            }
            self.hooks.run(stage, &self.state, &mut self.queue);
        }
        self.adapter.draw(&self.state.frame, &mut self.queue);
        self.adapter.draw_detail(&self.state.detail);
        self.state.cycles += 1;
        tracing::debug!(
            "cycle {} drew {} of {} records",
            self.state.cycles,
            self.state.derived.len(),
            self.state.measure_data.len()
        );
    }

    /// Apply queued events in batches until the queue stays empty
    ///
    /// Store changes in a batch are applied first and redrawn once; selections
    /// and resizes in the same batch are applied against the redrawn data.
    fn settle(&mut self) {
        let mut follow_ups = 0;
        while !self.queue.is_empty() {
            if follow_ups == MAX_FOLLOW_UP_CYCLES {
                self.queue.clear();
                self.diagnostics.push(DiagnosticKind::FollowUpLimitReached {
                    limit: MAX_FOLLOW_UP_CYCLES,
                });
                break;
            }
            follow_ups += 1;

            let events = self.queue.drain();
            self.diagnostics
                .push(DiagnosticKind::EventsCoalesced { count: events.len() });
            let (store_events, view_events): (Vec<_>, Vec<_>) =
                events.into_iter().partition(ControlEvent::mutates_store);

            let effect = self.apply_batch(store_events);
            self.render(effect);
            let effect = self.apply_batch(view_events);
            self.render(effect);
        }
    }

    fn apply_batch(&mut self, events: Vec<ControlEvent>) -> Effect {
        let mut effect = Effect::None;
        for event in events {
            match self.apply_event(event) {
                Ok(applied) => effect = effect.max(applied),
                Err(e) => tracing::warn!("skipping queued event: {}", e),
            }
        }
        effect
    }
}

fn finite_limit(which: &str, value: f64) -> VigilResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange(format!("{} limit must be finite, got {}", which, value)).into())
    }
}
