//! vigil-filter - Filter state store for safety charts
//!
//! Holds the value of every control and turns subsetter selections into a
//! filtered record set:
//!
//! - **Filter / Selection**: single-level, multi-level or "All" subsetters
//! - **apply**: AND of every active filter, pure and idempotent
//! - **build_filters**: drops filters whose column is absent or single-level
//! - **FilterStore**: the one mutable resource a chart owns

pub mod error;
pub mod eval;
pub mod filter;
pub mod prune;
pub mod store;

pub use error::*;
pub use eval::*;
pub use filter::*;
pub use prune::*;
pub use store::*;
