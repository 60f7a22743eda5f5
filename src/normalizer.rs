//! Metric normalization
//!
//! Pure functions mapping a raw metric value onto a comparable [0,1] scale.
//! Every variant is deterministic and total: degenerate input (zero variance,
//! empty reference distribution, collapsed bounds) yields the neutral value
//! 0.5 so downstream aggregation always receives a finite number. Out-of-range
//! raw values are clamped, never extrapolated.

use crate::types::NormalizationMethod;

/// Neutral value returned for degenerate input
pub const NEUTRAL: f64 = 0.5;

// Logistic approximation of the standard normal CDF; max abs error < 0.01.
const PROBIT_SCALE: f64 = 1.702;

/// Statistics a normalization method draws on
#[derive(Debug, Clone)]
pub struct NormalizationContext {
    /// Population or sample mean (z-score)
    pub mean: f64,
    /// Population or sample standard deviation (z-score)
    pub std_dev: f64,
    /// Logistic midpoint (sigmoid)
    pub midpoint: f64,
    /// Logistic scale (sigmoid)
    pub scale: f64,
    /// Reference distribution (robust scaling, percentile)
    pub reference: Vec<f64>,
    /// Lower bound (min-max)
    pub min_bound: f64,
    /// Upper bound (min-max)
    pub max_bound: f64,
}

impl Default for NormalizationContext {
    fn default() -> Self {
        Self {
            mean: 0.0,
            std_dev: 0.0,
            midpoint: 0.0,
            scale: 1.0,
            reference: Vec::new(),
            min_bound: 0.0,
            max_bound: 0.0,
        }
    }
}

impl NormalizationContext {
    /// Derive a context from a set of sample values.
    ///
    /// Mean/std, reference distribution, and min/max bounds all come from the
    /// samples; the sigmoid midpoint is centered on the sample mean with unit
    /// scale.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        let mut reference = samples.to_vec();
        reference.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let min_bound = reference.first().copied().unwrap_or(0.0);
        let max_bound = reference.last().copied().unwrap_or(0.0);

        Self {
            mean,
            std_dev: variance.sqrt(),
            midpoint: mean,
            scale: 1.0,
            reference,
            min_bound,
            max_bound,
        }
    }

    /// Override population statistics (e.g. from the parameter registry)
    pub fn with_population(mut self, mean: f64, std_dev: f64) -> Self {
        self.mean = mean;
        self.std_dev = std_dev;
        self.midpoint = mean;
        self
    }
}

/// Normalize a raw metric value onto [0,1] using the given method
pub fn normalize(method: NormalizationMethod, raw: f64, context: &NormalizationContext) -> f64 {
    if !raw.is_finite() {
        return NEUTRAL;
    }

    let value = match method {
        NormalizationMethod::ZScore => z_score(raw, context),
        NormalizationMethod::Sigmoid => sigmoid(raw, context),
        NormalizationMethod::RobustScaling => robust_scaling(raw, context),
        NormalizationMethod::Percentile => percentile(raw, context),
        NormalizationMethod::MinMax => min_max(raw, context),
    };

    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        NEUTRAL
    }
}

/// Z-score against population statistics, mapped through the logistic
/// approximation of the normal CDF so the mean lands exactly on 0.5
fn z_score(raw: f64, context: &NormalizationContext) -> f64 {
    if context.std_dev <= 0.0 {
        return NEUTRAL;
    }
    let z = (raw - context.mean) / context.std_dev;
    logistic(PROBIT_SCALE * z)
}

/// Logistic squashing around a configurable midpoint
fn sigmoid(raw: f64, context: &NormalizationContext) -> f64 {
    if context.scale <= 0.0 {
        return NEUTRAL;
    }
    logistic((raw - context.midpoint) / context.scale)
}

/// Median/IQR scaling against the reference distribution, recentred onto
/// [0,1] at a quarter unit per IQR
fn robust_scaling(raw: f64, context: &NormalizationContext) -> f64 {
    if context.reference.is_empty() {
        return NEUTRAL;
    }
    let median = quantile(&context.reference, 0.5);
    let iqr = quantile(&context.reference, 0.75) - quantile(&context.reference, 0.25);
    if iqr <= 0.0 {
        return NEUTRAL;
    }
    0.5 + ((raw - median) / iqr) * 0.25
}

/// Rank against the reference distribution: fraction of values <= raw
fn percentile(raw: f64, context: &NormalizationContext) -> f64 {
    if context.reference.is_empty() {
        return NEUTRAL;
    }
    let below = context.reference.iter().filter(|v| **v <= raw).count();
    below as f64 / context.reference.len() as f64
}

/// Linear rescale against configured bounds
fn min_max(raw: f64, context: &NormalizationContext) -> f64 {
    if context.max_bound <= context.min_bound {
        return NEUTRAL;
    }
    (raw - context.min_bound) / (context.max_bound - context.min_bound)
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Quantile of a sorted slice with linear interpolation
pub(crate) fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = q * (sorted.len() - 1) as f64;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    if low == high {
        sorted[low]
    } else {
        let fraction = position - low as f64;
        sorted[low] * (1.0 - fraction) + sorted[high] * fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizationMethod::*;

    #[test]
    fn test_z_score_of_mean_is_neutral_midpoint() {
        let context = NormalizationContext::default().with_population(30.5, 12.8);
        let value = normalize(ZScore, 30.5, &context);
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_z_score_monotone_and_bounded() {
        let context = NormalizationContext::default().with_population(30.5, 12.8);
        let low = normalize(ZScore, 10.0, &context);
        let mid = normalize(ZScore, 30.5, &context);
        let high = normalize(ZScore, 50.0, &context);

        assert!(low < mid && mid < high);
        // Extreme raw values stay clamped, never extrapolated
        assert!(normalize(ZScore, 1e9, &context) <= 1.0);
        assert!(normalize(ZScore, -1e9, &context) >= 0.0);
    }

    #[test]
    fn test_z_score_zero_variance_is_neutral() {
        let context = NormalizationContext::default().with_population(30.5, 0.0);
        assert_eq!(normalize(ZScore, 42.0, &context), NEUTRAL);
    }

    #[test]
    fn test_sigmoid_midpoint_and_degenerate_scale() {
        let context = NormalizationContext {
            midpoint: 5.0,
            scale: 2.0,
            ..Default::default()
        };
        assert!((normalize(Sigmoid, 5.0, &context) - 0.5).abs() < 1e-12);
        assert!(normalize(Sigmoid, 20.0, &context) > 0.9);

        let degenerate = NormalizationContext {
            scale: 0.0,
            ..Default::default()
        };
        assert_eq!(normalize(Sigmoid, 3.0, &degenerate), NEUTRAL);
    }

    #[test]
    fn test_robust_scaling_median_is_neutral() {
        let context = NormalizationContext::from_samples(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((normalize(RobustScaling, 3.0, &context) - 0.5).abs() < 1e-12);
        // One IQR above the median moves a quarter unit up
        assert!((normalize(RobustScaling, 5.0, &context) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_robust_scaling_degenerate_reference() {
        let empty = NormalizationContext::default();
        assert_eq!(normalize(RobustScaling, 3.0, &empty), NEUTRAL);

        let constant = NormalizationContext::from_samples(&[7.0, 7.0, 7.0]);
        assert_eq!(normalize(RobustScaling, 7.0, &constant), NEUTRAL);
    }

    #[test]
    fn test_percentile_rank() {
        let context = NormalizationContext::from_samples(&[10.0, 20.0, 30.0, 40.0]);
        assert!((normalize(Percentile, 20.0, &context) - 0.5).abs() < 1e-12);
        assert_eq!(normalize(Percentile, 45.0, &context), 1.0);
        assert_eq!(normalize(Percentile, 5.0, &context), 0.0);

        let empty = NormalizationContext::default();
        assert_eq!(normalize(Percentile, 1.0, &empty), NEUTRAL);
    }

    #[test]
    fn test_min_max_rescale_and_clamp() {
        let context = NormalizationContext {
            min_bound: 0.0,
            max_bound: 10.0,
            ..Default::default()
        };
        assert!((normalize(MinMax, 2.5, &context) - 0.25).abs() < 1e-12);
        assert_eq!(normalize(MinMax, 15.0, &context), 1.0);
        assert_eq!(normalize(MinMax, -3.0, &context), 0.0);

        let collapsed = NormalizationContext {
            min_bound: 4.0,
            max_bound: 4.0,
            ..Default::default()
        };
        assert_eq!(normalize(MinMax, 4.0, &collapsed), NEUTRAL);
    }

    #[test]
    fn test_non_finite_raw_degrades_to_neutral() {
        let context = NormalizationContext::from_samples(&[1.0, 2.0, 3.0]);
        for method in [ZScore, Sigmoid, RobustScaling, Percentile, MinMax] {
            assert_eq!(normalize(method, f64::NAN, &context), NEUTRAL);
            assert_eq!(normalize(method, f64::INFINITY, &context), NEUTRAL);
        }
    }

    #[test]
    fn test_determinism() {
        let context = NormalizationContext::from_samples(&[3.0, 1.0, 4.0, 1.0, 5.0]);
        for method in [ZScore, Sigmoid, RobustScaling, Percentile, MinMax] {
            let first = normalize(method, 2.5, &context);
            let second = normalize(method, 2.5, &context);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_context_from_samples() {
        let context = NormalizationContext::from_samples(&[2.0, 4.0, 6.0]);
        assert!((context.mean - 4.0).abs() < 1e-12);
        assert!((context.std_dev - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(context.min_bound, 2.0);
        assert_eq!(context.max_bound, 6.0);
        assert_eq!(context.reference, vec![2.0, 4.0, 6.0]);
    }
}
