//! Normal-range overlays
//!
//! Reference intervals can vary by lab, sex or age band, so one measure may
//! carry several distinct `(low, high)` pairs. Each distinct pair becomes a
//! band whose opacity reflects how many records use it. Bands are ordered so
//! that a range containing another is drawn first and sits beneath it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A reference interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalRange {
    pub low: f64,
    pub high: f64,
}

impl NormalRange {
    /// Create a range, swapping reversed bounds; `None` for non-finite bounds
    pub fn new(low: f64, high: f64) -> Option<Self> {
        if !low.is_finite() || !high.is_finite() {
            return None;
        }
        Some(if low <= high {
            Self { low, high }
        } else {
            Self {
                low: high,
                high: low,
            }
        })
    }

    /// Width of the interval
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Whether a value lies inside the interval (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    /// Whether this range fully contains another
    pub fn contains_range(&self, other: &NormalRange) -> bool {
        self.low <= other.low && self.high >= other.high
    }

    /// Clamp to a plotting domain
    pub fn clipped(&self, domain: (f64, f64)) -> NormalRange {
        NormalRange {
            low: self.low.clamp(domain.0, domain.1),
            high: self.high.clamp(domain.0, domain.1),
        }
    }

    fn key(&self) -> (u64, u64) {
        // +0.0 folds -0.0 into 0.0
        ((self.low + 0.0).to_bits(), (self.high + 0.0).to_bits())
    }
}

/// One distinct range with its record count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalRangeBand {
    pub range: NormalRange,
    /// Number of records carrying this range
    pub count: usize,
    /// `count` over all records with a range; drives band opacity
    pub fraction: f64,
}

impl NormalRangeBand {
    /// Tooltip text for the band
    pub fn tooltip(&self, precision: usize) -> String {
        format!(
            "Normal range: {:.prec$}-{:.prec$} ({} records)",
            self.range.low,
            self.range.high,
            self.count,
            prec = precision
        )
    }
}

/// Group ranges into bands, widest (containing) ranges first
pub fn normal_range_bands<I>(ranges: I) -> Vec<NormalRangeBand>
where
    I: IntoIterator<Item = NormalRange>,
{
    let mut counts: HashMap<(u64, u64), (NormalRange, usize)> = HashMap::new();
    let mut total = 0usize;
    for range in ranges {
        counts.entry(range.key()).or_insert((range, 0)).1 += 1;
        total += 1;
    }

    let mut bands: Vec<NormalRangeBand> = counts
        .into_values()
        .map(|(range, count)| NormalRangeBand {
            range,
            count,
            fraction: count as f64 / total as f64,
        })
        .collect();

    // A strict superset is always wider, so width-descending puts containers first.
    bands.sort_by(|a, b| {
        b.range
            .width()
            .total_cmp(&a.range.width())
            .then(a.range.low.total_cmp(&b.range.low))
            .then(b.range.high.total_cmp(&a.range.high))
    });
    bands
}
