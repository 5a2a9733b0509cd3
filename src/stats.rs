//! Descriptive statistics over one metric's non-absent values.
//!
//! Thin assembly over `u_numflow::stats`:
//!
//! - **Mean**: Neumaier compensated summation, bounded by the column's
//!   extrema so a constant column reports its value exactly.
//! - **Variance/StdDev**: Welford's online algorithm (sample, divisor `n − 1`).
//! - **Quantile**: R-7 linear interpolation, the default in R and NumPy,
//!   kept between its bracketing order statistics.
//!
//! All functions return `None` rather than `NaN` for undefined results.
//!
//! # Example
//!
//! ```
//! use equip_insight::stats::describe;
//!
//! let s = describe(&[10.0, 20.0, 30.0]);
//! assert_eq!(s.count, 3);
//! assert_eq!(s.mean, Some(20.0));
//! assert_eq!(s.median, Some(20.0));
//! assert_eq!(s.std, Some(10.0));
//! ```

use serde::Serialize;
use u_numflow::stats;

// ── Descriptive statistics ────────────────────────────────────────────

/// Count, mean, sample std and the five-number summary of a column.
///
/// When `count == 0` every other field is `None`. When `count == 1`
/// the standard deviation is `0.0` and all quantiles equal the value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl DescriptiveStats {
    /// Stats of an empty column.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Interquartile range, `q3 − q1`.
    pub fn iqr(&self) -> Option<f64> {
        Some(self.q3? - self.q1?)
    }

    /// `max − min`.
    pub fn range(&self) -> Option<f64> {
        Some(self.max? - self.min?)
    }

    /// Five-number summary `[min, q1, median, q3, max]`.
    pub fn five_number(&self) -> Option<[f64; 5]> {
        Some([self.min?, self.q1?, self.median?, self.q3?, self.max?])
    }
}

/// Computes [`DescriptiveStats`] for a slice of finite values.
///
/// Non-finite inputs are ignored; the normalizer never produces them.
pub fn describe(values: &[f64]) -> DescriptiveStats {
    let sorted = sorted_finite(values);
    describe_sorted(&sorted)
}

/// Computes [`DescriptiveStats`] for values already sorted ascending.
pub fn describe_sorted(sorted: &[f64]) -> DescriptiveStats {
    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return DescriptiveStats::empty();
    };
    let count = sorted.len();

    let std = if count == 1 {
        Some(0.0)
    } else {
        stats::std_dev(sorted)
    };

    DescriptiveStats {
        count,
        mean: stats::mean(sorted).map(|m| m.clamp(min, max)),
        std,
        min: Some(min),
        q1: quantile_sorted(sorted, 0.25),
        median: quantile_sorted(sorted, 0.5),
        q3: quantile_sorted(sorted, 0.75),
        max: Some(max),
    }
}

// ── Primitive helpers ─────────────────────────────────────────────────

/// Returns the finite values of `data`, sorted ascending.
pub fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    sorted.sort_unstable_by(f64::total_cmp);
    sorted
}

/// Arithmetic mean, bounded by the extrema of `data`.
///
/// Compensated summation can still land one ulp outside `[min, max]`
/// (three copies of `3.3` sum to a mean just below `3.3`); the result is
/// clamped back so strict comparisons against the mean stay exact.
///
/// Returns `None` if `data` is empty or contains NaN/Inf.
///
/// ```
/// use equip_insight::stats::mean;
/// assert_eq!(mean(&[3.3, 3.3, 3.3]), Some(3.3));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(data: &[f64]) -> Option<f64> {
    let m = stats::mean(data)?;
    let (lo, hi) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    Some(m.clamp(lo, hi))
}

/// Computes the `p`-th quantile on **pre-sorted** data (R-7 method).
///
/// Delegates to [`u_numflow::stats::quantile_sorted`] and keeps the result
/// within `[x[j], x[j+1]]` for `j = ⌊(n − 1)p⌋`, so rounding never breaks
/// quartile monotonicity.
///
/// Returns `None` if `sorted_data` is empty or `p` is outside `[0, 1]`.
///
/// ```
/// use equip_insight::stats::quantile_sorted;
/// let data = [1.0, 2.0, 3.0, 4.0];
/// assert_eq!(quantile_sorted(&data, 0.25), Some(1.75));
/// assert_eq!(quantile_sorted(&data, 1.0), Some(4.0));
/// ```
pub fn quantile_sorted(sorted_data: &[f64], p: f64) -> Option<f64> {
    let q = stats::quantile_sorted(sorted_data, p)?;
    let n = sorted_data.len();
    let j = (((n - 1) as f64 * p).floor() as usize).min(n - 1);
    let lo = sorted_data[j];
    let hi = sorted_data[(j + 1).min(n - 1)];
    Some(q.clamp(lo, hi))
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_three_values() {
        let s = describe(&[10.0, 20.0, 30.0]);
        assert_eq!(s.count, 3);
        assert!((s.mean.unwrap() - 20.0).abs() < 1e-12);
        assert!((s.median.unwrap() - 20.0).abs() < 1e-12);
        assert!((s.std.unwrap() - 10.0).abs() < 1e-12);
        assert_eq!(s.q1, Some(15.0));
        assert_eq!(s.q3, Some(25.0));
        assert_eq!(s.min, Some(10.0));
        assert_eq!(s.max, Some(30.0));
    }

    #[test]
    fn describe_single_value() {
        let s = describe(&[7.5]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, Some(0.0));
        assert_eq!(s.five_number(), Some([7.5; 5]));
        assert_eq!(s.mean, Some(7.5));
    }

    #[test]
    fn describe_empty_is_all_none() {
        let s = describe(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, None);
        assert_eq!(s.std, None);
        assert_eq!(s.min, None);
        assert_eq!(s.q1, None);
        assert_eq!(s.median, None);
        assert_eq!(s.q3, None);
        assert_eq!(s.max, None);
        assert_eq!(s.iqr(), None);
    }

    #[test]
    fn describe_ignores_non_finite() {
        let s = describe(&[1.0, f64::NAN, 3.0, f64::INFINITY]);
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, Some(2.0));
    }

    #[test]
    fn describe_unsorted_input() {
        let s = describe(&[5.0, 1.0, 4.0, 2.0, 3.0]);
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q1, Some(2.0));
        assert_eq!(s.median, Some(3.0));
        assert_eq!(s.q3, Some(4.0));
        assert_eq!(s.max, Some(5.0));
    }

    #[test]
    fn quantile_linear_interpolation() {
        let data: Vec<f64> = (0..=100).map(f64::from).collect();
        assert_eq!(quantile_sorted(&data, 0.25), Some(25.0));
        assert_eq!(quantile_sorted(&data, 0.5), Some(50.0));
        assert_eq!(quantile_sorted(&data, 0.75), Some(75.0));

        let even = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&even, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&even, 0.75), Some(3.25));
    }

    #[test]
    fn quantile_out_of_range() {
        assert_eq!(quantile_sorted(&[1.0, 2.0], -0.1), None);
        assert_eq!(quantile_sorted(&[1.0, 2.0], 1.1), None);
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn std_known_value() {
        let s = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((s.std.unwrap() - 4.571428571428571_f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn mean_rejects_non_finite() {
        assert_eq!(mean(&[1.0, f64::NAN]), None);
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0]), Some(1.5));
    }

    #[test]
    fn mean_of_repeated_inexact_value_is_exact() {
        for (v, n) in [(3.3, 3), (3.3, 6), (7.7, 9), (0.1, 10)] {
            let data = vec![v; n];
            assert_eq!(mean(&data), Some(v), "{n} copies of {v}");
            let s = describe(&data);
            assert_eq!(s.mean, Some(v));
            assert_eq!(s.std, Some(0.0));
        }
    }

    #[test]
    fn constant_column_has_zero_std() {
        let s = describe(&[4.2; 12]);
        assert!(s.std.unwrap().abs() < 1e-12);
        assert_eq!(s.iqr(), Some(0.0));
    }
}
