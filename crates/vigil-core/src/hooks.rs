//! Typed lifecycle hooks
//!
//! Hooks run after the chart's own work for each stage, in registration
//! order. They see the chart state read-only and may queue control events,
//! which are applied after the cycle.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::events::ControlQueue;
use crate::state::ChartState;

/// Lifecycle stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Init,
    Layout,
    Preprocess,
    Datatransform,
    Draw,
    Resize,
}

impl Stage {
    /// Stages of one draw cycle
    pub const CYCLE: [Stage; 4] = [
        Stage::Preprocess,
        Stage::Datatransform,
        Stage::Draw,
        Stage::Resize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Layout => "layout",
            Stage::Preprocess => "preprocess",
            Stage::Datatransform => "datatransform",
            Stage::Draw => "draw",
            Stage::Resize => "resize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Callbacks for chart lifecycle stages; every method defaults to a no-op
pub trait StageHooks {
    /// Unique id used for lookup and replacement
    fn id(&self) -> &str;

    fn on_init(&mut self, _state: &ChartState, _queue: &mut ControlQueue) {}

    fn on_layout(&mut self, _state: &ChartState, _queue: &mut ControlQueue) {}

    fn on_preprocess(&mut self, _state: &ChartState, _queue: &mut ControlQueue) {}

    fn on_datatransform(&mut self, _state: &ChartState, _queue: &mut ControlQueue) {}

    fn on_draw(&mut self, _state: &ChartState, _queue: &mut ControlQueue) {}

    fn on_resize(&mut self, _state: &ChartState, _queue: &mut ControlQueue) {}

    /// A participant was picked in the chart
    fn on_participant_selected(
        &mut self,
        _participant: &str,
        _state: &ChartState,
        _queue: &mut ControlQueue,
    ) {
    }
}

/// Registered hooks with lookup by id
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Box<dyn StageHooks>>,
    by_id: HashMap<String, usize>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook; a hook with the same id is replaced in place
    pub fn register(&mut self, hook: Box<dyn StageHooks>) {
        let id = hook.id().to_string();
        match self.by_id.get(&id) {
            Some(&index) => self.hooks[index] = hook,
            None => {
                self.by_id.insert(id, self.hooks.len());
                self.hooks.push(hook);
            }
        }
    }

    /// Get a hook by its id
    pub fn get(&self, id: &str) -> Option<&dyn StageHooks> {
        self.by_id.get(id).map(|&index| self.hooks[index].as_ref())
    }

    /// Ids in registration order
    pub fn ids(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook for a stage
    pub(crate) fn run(&mut self, stage: Stage, state: &ChartState, queue: &mut ControlQueue) {
        for hook in &mut self.hooks {
            match stage {
                Stage::Init => hook.on_init(state, queue),
                Stage::Layout => hook.on_layout(state, queue),
                Stage::Preprocess => hook.on_preprocess(state, queue),
                Stage::Datatransform => hook.on_datatransform(state, queue),
                Stage::Draw => hook.on_draw(state, queue),
                Stage::Resize => hook.on_resize(state, queue),
            }
        }
    }

    pub(crate) fn participant_selected(
        &mut self,
        participant: &str,
        state: &ChartState,
        queue: &mut ControlQueue,
    ) {
        for hook in &mut self.hooks {
            hook.on_participant_selected(participant, state, queue);
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.ids())
            .finish()
    }
}
