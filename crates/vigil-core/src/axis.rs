//! Axis domains, ticks and screen mapping
//!
//! Linear domains are always normalized before use: reversed bounds are
//! swapped and a domain collapsed to a point is padded symmetrically, so
//! every domain handed to the renderer satisfies `min < max`.

use serde::{Deserialize, Serialize};

use vigil_data::{DiagnosticKind, Diagnostics};
use vigil_stats::SummaryStats;

use crate::config::PlotSize;

/// A `[min, max]` domain with `min < max`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearDomain {
    pub min: f64,
    pub max: f64,
}

impl LinearDomain {
    /// Normalize user or data bounds, reporting any repair
    pub fn normalized(min: f64, max: f64, diagnostics: &mut Diagnostics) -> Self {
        let (mut lo, mut hi) = (min, max);
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
            diagnostics.push(DiagnosticKind::DomainSwapped { min: lo, max: hi });
        }
        if lo == hi {
            let (plo, phi) = pad_point(lo);
            diagnostics.push(DiagnosticKind::DomainPadded {
                value: lo,
                min: plo,
                max: phi,
            });
            lo = plo;
            hi = phi;
        }
        Self { min: lo, max: hi }
    }

    /// Normalize silently; used for extents that are routinely degenerate
    pub fn fit(min: f64, max: f64) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        if lo == hi {
            let (lo, hi) = pad_point(lo);
            Self { min: lo, max: hi }
        } else {
            Self { min: lo, max: hi }
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Whether a value lies inside the domain (inclusive)
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Position of a value as a fraction of the domain
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }
}

impl Default for LinearDomain {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Symmetric padding around a collapsed domain
///
/// One percent of the value either side, or one unit either side when that
/// rounds to nothing (zero and subnormal values).
pub fn pad_point(value: f64) -> (f64, f64) {
    let pad = value.abs() * 0.01;
    if pad == 0.0 {
        return (value - 1.0, value + 1.0);
    }
    ((value - pad).max(f64::MIN), (value + pad).min(f64::MAX))
}

/// Domain of one axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxisDomain {
    Linear { min: f64, max: f64 },
    Ordinal { categories: Vec<String> },
}

impl AxisDomain {
    pub fn linear(domain: LinearDomain) -> Self {
        AxisDomain::Linear {
            min: domain.min,
            max: domain.max,
        }
    }

    pub fn ordinal(categories: Vec<String>) -> Self {
        AxisDomain::Ordinal { categories }
    }

    /// Linear bounds, if this is a linear axis
    pub fn as_linear(&self) -> Option<LinearDomain> {
        match self {
            AxisDomain::Linear { min, max } => Some(LinearDomain {
                min: *min,
                max: *max,
            }),
            AxisDomain::Ordinal { .. } => None,
        }
    }

    /// Categories, if this is an ordinal axis
    pub fn categories(&self) -> Option<&[String]> {
        match self {
            AxisDomain::Ordinal { categories } => Some(categories),
            AxisDomain::Linear { .. } => None,
        }
    }
}

impl Default for AxisDomain {
    fn default() -> Self {
        AxisDomain::linear(LinearDomain::default())
    }
}

/// A labelled tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

/// Roughly `target` evenly spaced ticks at round numbers inside the domain
pub fn nice_ticks(domain: LinearDomain, target: usize, precision: usize) -> Vec<Tick> {
    let range = domain.span();
    if !(range > 0.0) || target == 0 {
        return Vec::new();
    }

    let rough_step = range / target as f64;
    let magnitude = 10.0_f64.powf(rough_step.log10().floor());
    let residual = rough_step / magnitude;
    let step = if residual <= 1.5 {
        magnitude
    } else if residual <= 3.0 {
        2.0 * magnitude
    } else if residual <= 7.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    };

    let first = (domain.min / step).ceil() as i64;
    let last = (domain.max / step + 1e-9).floor() as i64;
    (first..=last)
        .map(|i| i as f64 * step)
        .filter(|v| domain.contains(*v))
        .map(|value| Tick {
            value,
            label: format_number(value, precision),
        })
        .collect()
}

/// Value-axis ticks, falling back to the quartiles when fewer than two
/// round numbers fit
pub fn value_ticks(
    domain: LinearDomain,
    target: usize,
    stats: Option<&SummaryStats>,
    precision: usize,
) -> Vec<Tick> {
    let ticks = nice_ticks(domain, target, precision);
    if ticks.len() >= 2 {
        return ticks;
    }
    match stats {
        Some(s) => {
            let mut quartiles = vec![s.p25, s.p75];
            quartiles.dedup();
            quartiles
                .into_iter()
                .map(|value| Tick {
                    value,
                    label: format_number(value, precision),
                })
                .collect()
        }
        None => Vec::new(),
    }
}

/// Format a number with fixed precision, dropping a negative zero
pub fn format_number(value: f64, precision: usize) -> String {
    let text = format!("{:.prec$}", value, prec = precision);
    if text.starts_with('-') && text[1..].chars().all(|c| c == '0' || c == '.') {
        text[1..].to_string()
    } else {
        text
    }
}

/// Axis label of a measure, with its unit when known
pub fn axis_label(measure: &str, unit: &str) -> String {
    if unit.trim().is_empty() {
        measure.to_string()
    } else {
        format!("{} ({})", measure, unit.trim())
    }
}

/// Mapping between the plot area in pixels and two linear data domains
///
/// Pixel `y` grows downward, so the data `y` axis is flipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub size: PlotSize,
    pub x: LinearDomain,
    pub y: LinearDomain,
}

impl PlotArea {
    pub fn new(size: PlotSize, x: LinearDomain, y: LinearDomain) -> Self {
        Self { size, x, y }
    }

    /// Data coordinates to pixels
    pub fn data_to_pixel(&self, x: f64, y: f64) -> (f32, f32) {
        let px = self.x.normalize(x) as f32 * self.size.width;
        let py = (1.0 - self.y.normalize(y) as f32) * self.size.height;
        (px, py)
    }

    /// Pixels to data coordinates
    pub fn pixel_to_data(&self, px: f32, py: f32) -> (f64, f64) {
        let x_norm = (px / self.size.width) as f64;
        let y_norm = 1.0 - (py / self.size.height) as f64;
        (
            self.x.min + x_norm * self.x.span(),
            self.y.min + y_norm * self.y.span(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_swaps_and_pads() {
        let mut diagnostics = Diagnostics::new();

        let d = LinearDomain::normalized(10.0, 2.0, &mut diagnostics);
        assert_eq!((d.min, d.max), (2.0, 10.0));
        assert_eq!(diagnostics.len(), 1);

        let d = LinearDomain::normalized(50.0, 50.0, &mut diagnostics);
        assert_eq!((d.min, d.max), (49.5, 50.5));

        let d = LinearDomain::normalized(0.0, 0.0, &mut diagnostics);
        assert_eq!((d.min, d.max), (-1.0, 1.0));
        assert_eq!(diagnostics.len(), 3);

        let d = LinearDomain::normalized(1.0, 4.0, &mut diagnostics);
        assert_eq!((d.min, d.max), (1.0, 4.0));
        assert_eq!(diagnostics.len(), 3);
    }

    #[test]
    fn test_pad_point_never_collapses() {
        let tiny = 1e-322;
        assert_eq!(pad_point(tiny), (tiny - 1.0, tiny + 1.0));
        assert_eq!(pad_point(0.0), (-1.0, 1.0));

        let (lo, hi) = pad_point(f64::MAX);
        assert!(lo < hi);
        assert_eq!(hi, f64::MAX);

        let mut diagnostics = Diagnostics::new();
        let d = LinearDomain::normalized(5e-324, 5e-324, &mut diagnostics);
        assert!(d.min < d.max);
    }

    #[test]
    fn test_fit_pads_negative_point() {
        let d = LinearDomain::fit(-200.0, -200.0);
        assert_eq!((d.min, d.max), (-202.0, -198.0));
    }

    #[test]
    fn test_nice_ticks() {
        let ticks = nice_ticks(LinearDomain { min: 0.0, max: 10.0 }, 5, 0);
        let values: Vec<f64> = ticks.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(ticks[1].label, "2");
    }

    #[test]
    fn test_value_ticks_quartile_fallback() {
        let stats = SummaryStats::from_data(&[1.05, 1.1, 1.15, 1.2, 1.25]).unwrap();
        let domain = LinearDomain { min: 1.01, max: 1.26 };
        assert_eq!(nice_ticks(domain, 1, 2).len(), 1);

        let ticks = value_ticks(domain, 1, Some(&stats), 2);
        let labels: Vec<&str> = ticks.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["1.10", "1.20"]);

        assert_eq!(value_ticks(domain, 5, Some(&stats), 2).len(), 5);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.14159, 2), "3.14");
        assert_eq!(format_number(-0.001, 1), "0.0");
        assert_eq!(format_number(-2.5, 1), "-2.5");
    }

    #[test]
    fn test_axis_label() {
        assert_eq!(axis_label("ALT", "U/L"), "ALT (U/L)");
        assert_eq!(axis_label("pH", ""), "pH");
    }

    #[test]
    fn test_plot_area_round_trip() {
        let area = PlotArea::new(
            PlotSize {
                width: 400.0,
                height: 200.0,
            },
            LinearDomain { min: 0.0, max: 100.0 },
            LinearDomain { min: -10.0, max: 10.0 },
        );

        assert_eq!(area.data_to_pixel(50.0, 10.0), (200.0, 0.0));
        let (x, y) = area.pixel_to_data(100.0, 150.0);
        assert!((x - 25.0).abs() < 1e-6);
        assert!((y + 5.0).abs() < 1e-6);
    }
}
