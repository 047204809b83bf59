//! Box-plot summary statistics
//!
//! One [`SummaryStats`] describes the values of a single group at a single
//! axis position:
//! - 5th, 25th, 50th, 75th and 95th percentiles
//! - Min, max, mean
//! - Sample standard deviation

use serde::{Deserialize, Serialize};

use crate::quantile::{quantile_sorted, sample_std_dev, sorted_finite};

/// Summary statistics for one group of observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Number of values
    pub count: usize,
    /// Number of missing/NaN values that were skipped
    pub missing: usize,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean (average)
    pub mean: f64,
    /// Sample standard deviation, undefined for a single value
    pub std_dev: Option<f64>,
    /// 5th percentile
    pub p05: f64,
    /// First quartile
    pub p25: f64,
    /// Median (50th percentile)
    pub median: f64,
    /// Third quartile
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
}

impl SummaryStats {
    /// Compute summary statistics from data
    ///
    /// Returns `None` when no finite value is present.
    pub fn from_data(data: &[f64]) -> Option<Self> {
        let sorted = sorted_finite(data);
        let missing = data.len() - sorted.len();
        let count = sorted.len();
        if count == 0 {
            return None;
        }

        let q = |p: f64| quantile_sorted(&sorted, p).unwrap_or(f64::NAN);

        Some(Self {
            count,
            missing,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sorted.iter().sum::<f64>() / count as f64,
            std_dev: sample_std_dev(&sorted),
            p05: q(0.05),
            p25: q(0.25),
            median: q(0.5),
            p75: q(0.75),
            p95: q(0.95),
        })
    }

    /// Get the range (max - min)
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Multi-line tooltip shown when hovering a box
    pub fn tooltip(&self, precision: usize) -> String {
        let f = |v: f64| format!("{:.prec$}", v, prec = precision);
        let sd = self.std_dev.map(f).unwrap_or_else(|| "-".to_string());
        format!(
            "N = {}\nMin = {}\n5th % = {}\nQ1 = {}\nMedian = {}\nQ3 = {}\n95th % = {}\nMax = {}\nMean = {}\nStDev = {}",
            self.count,
            f(self.min),
            f(self.p05),
            f(self.p25),
            f(self.median),
            f(self.p75),
            f(self.p95),
            f(self.max),
            f(self.mean),
            sd
        )
    }
}

/// Decimal places that keep the spread of a value set readable
///
/// Narrow ranges get more digits so neighbouring ticks and tooltip values stay
/// distinct.
pub fn display_precision(min: f64, max: f64) -> usize {
    let range = (max - min).abs();
    if !range.is_finite() || range == 0.0 {
        return 2;
    }
    let digits = -(range.log10().floor()) + 1.0;
    digits.clamp(0.0, 6.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_stats_basic() {
        let stats = SummaryStats::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.p25, 2.0);
        assert_eq!(stats.p75, 4.0);
        assert!((stats.std_dev.unwrap() - 2.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_summary_stats_with_nan() {
        let stats = SummaryStats::from_data(&[1.0, 2.0, f64::NAN, 4.0, 5.0]).unwrap();

        assert_eq!(stats.count, 4);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_single_value() {
        let stats = SummaryStats::from_data(&[42.0]).unwrap();

        assert_eq!(stats.p05, 42.0);
        assert_eq!(stats.median, 42.0);
        assert_eq!(stats.p95, 42.0);
        assert_eq!(stats.std_dev, None);
        assert_eq!(stats.range(), 0.0);
    }

    #[test]
    fn test_empty() {
        assert!(SummaryStats::from_data(&[]).is_none());
        assert!(SummaryStats::from_data(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_tooltip() {
        let stats = SummaryStats::from_data(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let tip = stats.tooltip(1);

        assert!(tip.starts_with("N = 5\nMin = 1.0\n5th % = 1.2\n"));
        assert!(tip.contains("Median = 3.0"));
        assert!(tip.ends_with("StDev = 1.6"));

        let single = SummaryStats::from_data(&[2.0]).unwrap();
        assert!(single.tooltip(0).ends_with("StDev = -"));
    }

    #[test]
    fn test_display_precision() {
        assert_eq!(display_precision(0.0, 100.0), 0);
        assert_eq!(display_precision(0.0, 5.0), 1);
        assert_eq!(display_precision(0.1, 0.35), 2);
        assert_eq!(display_precision(3.0, 3.0), 2);
    }
}
