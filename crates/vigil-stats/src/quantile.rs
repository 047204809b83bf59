//! Quantiles and moment helpers
//!
//! Quantiles use linear interpolation between order statistics (the R-7
//! rule): for `n` sorted values the `q` quantile sits at index `q * (n - 1)`.

/// Quantile of an already sorted slice
///
/// Returns `None` for an empty slice. `q` is clamped to `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 || q.is_nan() {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let h = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (h.ceil() as usize).min(n - 1);
    Some(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Quantile of unsorted data; non-finite values are ignored
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted_finite(values), q)
}

/// Median of unsorted data
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Finite values in ascending order
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// `(min, max)` of the finite values
pub fn extent(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(None, |acc, x| match acc {
            None => Some((x, x)),
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
        })
}

/// Arithmetic mean of the finite values
pub fn mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|x| x.is_finite())
        .fold((0.0, 0usize), |(s, c), x| (s + x, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Sample standard deviation (n - 1 denominator)
///
/// Undefined for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if finite.len() < 2 {
        return None;
    }
    let m = finite.iter().sum::<f64>() / finite.len() as f64;
    let ss: f64 = finite.iter().map(|x| (x - m).powi(2)).sum();
    Some((ss / (finite.len() - 1) as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.25, 2.0)]
    #[case(0.5, 3.0)]
    #[case(1.0, 5.0)]
    #[case(0.05, 1.2)]
    #[case(0.95, 4.8)]
    fn test_quantile_linear_interpolation(#[case] q: f64, #[case] expected: f64) {
        let data = [5.0, 3.0, 1.0, 4.0, 2.0];
        assert!((quantile(&data, q).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_even_count_median() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    #[test]
    fn test_quantile_single_value() {
        for q in [0.0, 0.05, 0.5, 0.95, 1.0] {
            assert_eq!(quantile(&[7.0], q), Some(7.0));
        }
    }

    #[test]
    fn test_quantile_empty() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[f64::NAN], 0.5), None);
    }

    #[test]
    fn test_std_dev_sample() {
        let sd = sample_std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((sd - 2.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(sample_std_dev(&[4.0]), None);
    }

    #[test]
    fn test_extent_skips_nan() {
        assert_eq!(extent(&[3.0, f64::NAN, -1.0, 8.0]), Some((-1.0, 8.0)));
        assert_eq!(extent(&[]), None);
    }
}
