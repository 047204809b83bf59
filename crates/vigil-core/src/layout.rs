//! Band layout for grouped overlays
//!
//! Each category on an ordinal axis owns a band of equal width. Within a
//! band, `n` groups sit at offsets spaced `band / (n + 1)` apart, mirrored
//! around the band center and alternating left and right.

use serde::{Deserialize, Serialize};

/// Ordinal axis mapped onto a pixel extent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandScale {
    pub categories: Vec<String>,
    /// Pixel extent of the whole axis
    pub extent: f32,
}

impl BandScale {
    pub fn new(categories: Vec<String>, extent: f32) -> Self {
        Self { categories, extent }
    }

    /// Width of one band
    pub fn bandwidth(&self) -> f32 {
        if self.categories.is_empty() {
            0.0
        } else {
            self.extent / self.categories.len() as f32
        }
    }

    /// Pixel center of a category's band
    pub fn center(&self, category: &str) -> Option<f32> {
        let index = self.categories.iter().position(|c| c == category)?;
        Some((index as f32 + 0.5) * self.bandwidth())
    }
}

/// Spacing between neighbouring groups inside a band
pub fn group_spacing(bandwidth: f32, groups: usize) -> f32 {
    bandwidth / (groups + 1) as f32
}

/// Offsets of `n` groups from the band center, in group order
///
/// An odd count centers the first group and places the rest in mirrored
/// pairs; an even count offsets every group by a half step. Within each
/// pair the earlier group goes left.
pub fn group_offsets(groups: usize, bandwidth: f32) -> Vec<f32> {
    let spacing = group_spacing(bandwidth, groups);
    (0..groups)
        .map(|i| {
            if groups % 2 == 0 {
                let k = (i / 2) as f32;
                let sign = if i % 2 == 0 { -1.0 } else { 1.0 };
                sign * (k + 0.5) * spacing
            } else if i == 0 {
                0.0
            } else {
                let k = ((i + 1) / 2) as f32;
                let sign = if i % 2 == 1 { -1.0 } else { 1.0 };
                sign * k * spacing
            }
        })
        .collect()
}

/// Width of one box so that neighbouring groups do not overlap
pub fn box_width(bandwidth: f32, groups: usize) -> f32 {
    group_spacing(bandwidth, groups) * 0.8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_groups_symmetric() {
        let offsets = group_offsets(2, 90.0);
        assert_eq!(offsets, vec![-15.0, 15.0]);
    }

    #[test]
    fn test_single_group_centered() {
        assert_eq!(group_offsets(1, 50.0), vec![0.0]);
        assert!(group_offsets(0, 50.0).is_empty());
    }

    #[test]
    fn test_odd_and_even_counts() {
        assert_eq!(group_offsets(3, 40.0), vec![0.0, -10.0, 10.0]);
        assert_eq!(group_offsets(4, 50.0), vec![-5.0, 5.0, -15.0, 15.0]);
    }

    #[test]
    fn test_offsets_sum_to_zero() {
        for n in 1..9 {
            let total: f32 = group_offsets(n, 120.0).iter().sum();
            assert!(total.abs() < 1e-4, "n = {}", n);
        }
    }

    #[test]
    fn test_band_scale() {
        let scale = BandScale::new(vec!["A".into(), "B".into(), "C".into(), "D".into()], 400.0);
        assert_eq!(scale.bandwidth(), 100.0);
        assert_eq!(scale.center("C"), Some(250.0));
        assert_eq!(scale.center("Z"), None);
    }
}
