//! Descriptive statistics over score vectors.
//!
//! An empty cohort is a valid, displayable state, so every scalar statistic
//! here returns 0 for empty input instead of NaN or an error.

use serde::{Deserialize, Serialize};

/// Summary of a score vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreStats {
    pub fn from_scores(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        Self {
            count: values.len(),
            mean: mean(values),
            median: median(values),
            std: std_dev(values),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Middle element of the sorted vector (upper middle for even lengths).
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[sorted.len() / 2]
}

/// Population variance.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// `std / mean * 100`; 0 when the mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.abs() < f64::EPSILON {
        return 0.0;
    }
    std_dev(values) / m * 100.0
}

/// Third standardized moment; 0 for constant or empty input.
pub fn skewness(values: &[f64]) -> f64 {
    standardized_moment(values, 3)
}

/// Fourth standardized moment (not excess-adjusted); 0 for constant or
/// empty input.
pub fn kurtosis(values: &[f64]) -> f64 {
    standardized_moment(values, 4)
}

fn standardized_moment(values: &[f64], order: i32) -> f64 {
    let sd = std_dev(values);
    if values.is_empty() || sd < 1e-12 {
        return 0.0;
    }
    let m = mean(values);
    let moment = values.iter().map(|x| (x - m).powi(order)).sum::<f64>() / values.len() as f64;
    moment / sd.powi(order)
}

/// Counts of values in `bins` equal-width bins over `[0, 1]`.
///
/// Values are clamped into range, so 1.0 lands in the last bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    for &v in values {
        counts[unit_bucket(v, bins)] += 1;
    }
    counts
}

/// Bucket index of a `[0, 1]` value among `buckets` equal-width buckets.
pub(crate) fn unit_bucket(value: f64, buckets: usize) -> usize {
    let clamped = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    ((clamped * buckets as f64).floor() as usize).min(buckets.saturating_sub(1))
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_empty_is_all_zero() {
        let stats = ScoreStats::from_scores(&[]);
        assert_eq!(stats, ScoreStats::default());
        assert_eq!(skewness(&[]), 0.0);
        assert_eq!(kurtosis(&[]), 0.0);
        assert_eq!(coefficient_of_variation(&[]), 0.0);
    }

    #[test]
    fn test_basic_stats() {
        let stats = ScoreStats::from_scores(&[0.2, 0.4, 0.6, 0.8]);
        assert_eq!(stats.count, 4);
        assert_abs_diff_eq!(stats.mean, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.median, 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.std, 0.05f64.sqrt(), epsilon = 1e-12);
        assert_eq!(stats.min, 0.2);
        assert_eq!(stats.max, 0.8);
    }

    #[test]
    fn test_median_odd() {
        assert_eq!(median(&[0.9, 0.1, 0.5]), 0.5);
    }

    #[test]
    fn test_cv_constant_is_zero() {
        assert_abs_diff_eq!(coefficient_of_variation(&[0.8, 0.8, 0.8]), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_symmetric_distribution_has_no_skew() {
        assert_abs_diff_eq!(skewness(&[0.1, 0.5, 0.9]), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_two_point_kurtosis() {
        // Balanced two-point distribution has raw kurtosis exactly 1.
        assert_abs_diff_eq!(kurtosis(&[0.0, 1.0, 0.0, 1.0]), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_right_skew_is_positive() {
        assert!(skewness(&[0.1, 0.1, 0.1, 0.2, 0.9]) > 0.0);
    }

    #[test]
    fn test_histogram_edges() {
        let counts = histogram(&[0.0, 0.19, 0.2, 0.5, 1.0, 1.2], 5);
        assert_eq!(counts, vec![2, 1, 1, 0, 2]);
    }

    #[test]
    fn test_ratio_guard() {
        assert_eq!(ratio(3.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, 4.0), 0.25);
    }
}
