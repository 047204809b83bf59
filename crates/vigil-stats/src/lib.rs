//! vigil-stats - Statistical summaries for safety charts
//!
//! Everything a chart recomputes on each draw from the current values of one
//! group at one axis position:
//!
//! - **Quantiles**: R-7 linear interpolation, mean, sample standard deviation
//! - **SummaryStats**: box-plot five-number summary plus mean and spread
//! - **Histogram / ViolinProfile**: equal-width binning and density silhouettes
//! - **Normal ranges**: distinct reference intervals layered widest first

pub mod histogram;
pub mod normal_range;
pub mod quantile;
pub mod summary;

pub use histogram::*;
pub use normal_range::*;
pub use quantile::*;
pub use summary::*;
