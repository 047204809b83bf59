//! vigil-core - Reactive chart pipeline for clinical-trial safety data
//!
//! Drives a family of safety charts (results over time, outlier explorer,
//! histogram, shift plot) from long-format lab records through a fixed
//! lifecycle: init, layout, then preprocess, datatransform, draw and resize
//! on every change.
//!
//! - **ChartSettings**: immutable host configuration, resolved once
//! - **Resolver**: data cleaning, measure classification and visit order
//! - **ChartState**: everything the stages derive, readable by hooks
//! - **Chart**: lifecycle controller with the control-event queue
//! - **RenderFrame / DetailView**: the contract handed to a [`RenderAdapter`]

pub mod adapter;
pub mod axis;
pub mod chart;
pub mod config;
pub mod controls;
pub mod detail;
pub mod error;
pub mod events;
pub mod frame;
pub mod hooks;
pub mod layout;
mod pipeline;
pub mod population;
pub mod resolver;
pub mod shift;
pub mod state;

pub use adapter::*;
pub use axis::*;
pub use chart::*;
pub use config::*;
pub use controls::*;
pub use detail::*;
pub use error::*;
pub use events::*;
pub use frame::*;
pub use hooks::*;
pub use layout::*;
pub use population::*;
pub use resolver::*;
pub use shift::*;
pub use state::*;
