//! Equal-width histograms and violin profiles
//!
//! Bins are half-open `[x0, x1)` except the last, which also includes the
//! upper edge so the maximum value always lands in a bin.

use serde::{Deserialize, Serialize};

use crate::quantile::extent;

/// Default number of bins for violin silhouettes
pub const DEFAULT_VIOLIN_BINS: usize = 10;

/// One bar of a histogram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// Lower edge
    pub x0: f64,
    /// Upper edge
    pub x1: f64,
    /// Number of values in the bin
    pub count: usize,
    /// Share of all binned values (0..=1)
    pub density: f64,
}

impl HistogramBin {
    /// Bin width
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }
}

/// Equal-width histogram over a fixed domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bins in ascending order
    pub bins: Vec<HistogramBin>,
    /// Number of values that fell inside the domain
    pub total: usize,
    /// Domain the bins partition
    pub domain: (f64, f64),
}

impl Histogram {
    /// Histogram over the extent of the data
    ///
    /// Returns `None` when there is no finite value. A data set with a single
    /// distinct value yields one zero-width bin holding everything.
    pub fn equal_width(values: &[f64], bins: usize) -> Option<Self> {
        let domain = extent(values)?;
        Some(Self::with_domain(values, domain, bins))
    }

    /// Histogram over an explicit domain; values outside it are not counted
    pub fn with_domain(values: &[f64], domain: (f64, f64), bins: usize) -> Self {
        let (lo, hi) = if domain.0 <= domain.1 {
            domain
        } else {
            (domain.1, domain.0)
        };
        let n_bins = if hi > lo { bins.max(1) } else { 1 };
        let width = (hi - lo) / n_bins as f64;

        let mut counts = vec![0usize; n_bins];
        for &v in values {
            if let Some(i) = bin_index_for(v, lo, hi, width, n_bins) {
                counts[i] += 1;
            }
        }
        let total: usize = counts.iter().sum();

        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                x0: lo + i as f64 * width,
                x1: if i + 1 == n_bins {
                    hi
                } else {
                    lo + (i + 1) as f64 * width
                },
                count,
                density: if total > 0 {
                    count as f64 / total as f64
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            bins,
            total,
            domain: (lo, hi),
        }
    }

    /// Index of the bin a value falls into, if any
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        let (lo, hi) = self.domain;
        let n = self.bins.len();
        let width = if n > 0 { (hi - lo) / n as f64 } else { 0.0 };
        bin_index_for(value, lo, hi, width, n)
    }

    /// Largest bin count
    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

fn bin_index_for(value: f64, lo: f64, hi: f64, width: f64, n_bins: usize) -> Option<usize> {
    if !value.is_finite() || value < lo || value > hi || n_bins == 0 {
        return None;
    }
    if width <= 0.0 {
        return Some(0);
    }
    let i = ((value - lo) / width).floor() as usize;
    Some(i.min(n_bins - 1))
}

/// Binned density silhouette drawn as a violin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolinProfile {
    /// Boundary bin at the minimum, the equal-width bins, boundary bin at the maximum
    pub bins: Vec<HistogramBin>,
    /// Largest density, used to scale the silhouette width
    pub max_density: f64,
}

impl ViolinProfile {
    /// Build a violin profile from raw values
    ///
    /// The first and last entries are zero-width, zero-height bins at the data
    /// minimum and maximum so the outline closes exactly at the extremes.
    pub fn from_data(values: &[f64], bins: usize) -> Option<Self> {
        let histogram = Histogram::equal_width(values, bins)?;
        let (min, max) = histogram.domain;

        let boundary = |x: f64| HistogramBin {
            x0: x,
            x1: x,
            count: 0,
            density: 0.0,
        };

        let max_density = histogram
            .bins
            .iter()
            .map(|b| b.density)
            .fold(0.0, f64::max);

        let mut profile = Vec::with_capacity(histogram.bins.len() + 2);
        profile.push(boundary(min));
        profile.extend(histogram.bins);
        profile.push(boundary(max));

        Some(Self {
            bins: profile,
            max_density,
        })
    }
}
