//! Threshold Calculator: cutoffs relative to the observed distribution.
//!
//! Spending and frequency cutoffs are linear-interpolation percentiles.
//! The recency cutoff is mean + multiplier × sample standard deviation
//! of days since last purchase.

use crate::{
    error::{InsightError, InsightResult},
    features::FeatureSet,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentationThresholds {
    pub spending_high:     f64,
    pub spending_medium:   f64,
    pub frequency_high:    f64,
    pub frequency_medium:  f64,
    pub recency_cutoff:    f64,
}

/// Percentile of already-sorted values with linear interpolation
/// between order statistics at position `q × (n − 1)`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation with `ddof` delta degrees of freedom.
pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - ddof) as f64).sqrt()
}

fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

fn check_quantile(name: &'static str, q: f64) -> InsightResult<()> {
    if !(0.0..=1.0).contains(&q) {
        return Err(InsightError::InvalidParameter {
            name,
            reason: format!("{q} is outside [0, 1]"),
        });
    }
    Ok(())
}

/// Derive the five cutoffs from the full feature set.
///
/// Fails with `InsufficientCustomers` below two customers, where the
/// standard deviation is undefined.
pub fn compute_thresholds(
    features: &FeatureSet,
    high_pct: f64,
    medium_pct: f64,
    recency_mult: f64,
) -> InsightResult<SegmentationThresholds> {
    check_quantile("high_percentile", high_pct)?;
    check_quantile("medium_percentile", medium_pct)?;
    if features.len() < 2 {
        return Err(InsightError::InsufficientCustomers { found: features.len() });
    }

    let spending = sorted(features.iter().map(|v| v.total_spending).collect());
    let frequency = sorted(features.iter().map(|v| v.purchase_frequency as f64).collect());
    let recency: Vec<f64> = features
        .iter()
        .map(|v| v.days_since_last_purchase as f64)
        .collect();

    let thresholds = SegmentationThresholds {
        spending_high:    percentile(&spending, high_pct),
        spending_medium:  percentile(&spending, medium_pct),
        frequency_high:   percentile(&frequency, high_pct),
        frequency_medium: percentile(&frequency, medium_pct),
        recency_cutoff:   mean(&recency) + recency_mult * std_dev(&recency, 1),
    };
    log::info!(
        "thresholds: spend high={:.2} medium={:.2}, freq high={:.1} medium={:.1}, recency={:.1}d",
        thresholds.spending_high,
        thresholds.spending_medium,
        thresholds.frequency_high,
        thresholds.frequency_medium,
        thresholds.recency_cutoff,
    );
    Ok(thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_between_order_statistics() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 1.0), 4.0);
        assert!((percentile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((percentile(&v, 0.75) - 3.25).abs() < 1e-12);
    }

    #[test]
    fn single_value_percentile() {
        assert_eq!(percentile(&[7.0], 0.75), 7.0);
    }

    #[test]
    fn sample_std_dev() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&v, 0) - 2.0).abs() < 1e-12);
        assert!((std_dev(&v, 1) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }
}
