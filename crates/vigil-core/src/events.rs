//! Control events and the single-writer queue
//!
//! Controls are inert while a draw cycle runs. Events raised during a cycle
//! (by a stage hook or the rendering adapter) go into the [`ControlQueue`];
//! when the cycle finishes they are applied together and exactly one
//! follow-up cycle runs.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use vigil_filter::{Selection, Toggle};

use crate::detail::SelectionCriterion;

/// Follow-up cycles allowed before queued events are dropped
pub const MAX_FOLLOW_UP_CYCLES: usize = 8;

/// A user or host action on the control panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ControlEvent {
    SetMeasure { measure: String },
    SetFilter { column: String, selection: Selection },
    ResetFilters,
    SetGroup { group: String },
    SetTimeColumn { column: String },
    SetToggle { toggle: Toggle, value: bool },
    SetLowerLimit { value: f64 },
    SetUpperLimit { value: f64 },
    ResetLimits,
    SetBaselineVisits { visits: Vec<String> },
    SetComparisonVisits { visits: Vec<String> },
    Resize { width: f32, height: f32 },
    Select { criterion: SelectionCriterion },
    ClearSelection,
}

impl ControlEvent {
    /// Whether the event changes the filter store and needs a full cycle
    pub fn mutates_store(&self) -> bool {
        !matches!(
            self,
            ControlEvent::Resize { .. } | ControlEvent::Select { .. } | ControlEvent::ClearSelection
        )
    }
}

/// Events waiting for the current cycle to finish
#[derive(Debug, Clone, Default)]
pub struct ControlQueue {
    pending: VecDeque<ControlEvent>,
}

impl ControlQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for after the current cycle
    pub fn push(&mut self, event: ControlEvent) {
        tracing::trace!("queued {:?}", event);
        self.pending.push_back(event);
    }

    /// Take every queued event in arrival order
    pub fn drain(&mut self) -> Vec<ControlEvent> {
        self.pending.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
