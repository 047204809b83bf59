//! vigil-data - Record model for safety charts
//!
//! This crate holds the pieces every chart layer shares:
//!
//! - **Value / Record**: long-format rows keyed by column name
//! - **Dataset**: the immutable, shared record set a chart is built on
//! - **DataSchema**: numeric vs categorical typing and level counts
//! - **Diagnostics**: the structured channel for non-fatal data problems

pub mod diagnostics;
pub mod error;
pub mod record;
pub mod schema;
pub mod value;

pub use diagnostics::*;
pub use error::*;
pub use record::*;
pub use schema::*;
pub use value::*;
