//! Dispersion-based reliability scoring
//!
//! Reliability is derived from the coefficient of variation of the raw metric
//! values in a session: the noisier the measurements, the lower the score.
//! The score lives on [50,100] so that even degenerate input maps onto the
//! same scale the release threshold is expressed in.

/// Score assigned when no meaningful dispersion can be computed
pub const FLOOR: f64 = 50.0;

/// Reliability score for a set of raw metric values.
///
/// Computed as `100 - cv * 100` where `cv` is the coefficient of variation
/// (population standard deviation over mean), clamped to [50,100]. An empty
/// set or a non-positive mean yields the floor.
pub fn reliability_score(values: &[f64]) -> f64 {
    if values.is_empty() {
        return FLOOR;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean <= 0.0 {
        return FLOOR;
    }

    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    let cv = variance.sqrt() / mean;

    (100.0 - cv * 100.0).clamp(FLOOR, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_values_are_fully_reliable() {
        assert_eq!(reliability_score(&[10.0, 10.0, 10.0, 10.0]), 100.0);
    }

    #[test]
    fn test_empty_input_yields_floor() {
        assert_eq!(reliability_score(&[]), FLOOR);
    }

    #[test]
    fn test_non_positive_mean_yields_floor() {
        assert_eq!(reliability_score(&[-1.0, -2.0, -3.0]), FLOOR);
        assert_eq!(reliability_score(&[1.0, -1.0]), FLOOR);
    }

    #[test]
    fn test_low_dispersion_scores_high() {
        // cv = sqrt(2/3) / 10 ~ 0.0816 -> ~91.8
        let score = reliability_score(&[9.0, 10.0, 11.0]);
        assert!(score > 90.0 && score < 95.0);
    }

    #[test]
    fn test_high_dispersion_clamps_to_floor() {
        // cv well above 0.5 drags the raw score under 50
        let score = reliability_score(&[1.0, 100.0, 1.0, 100.0]);
        assert_eq!(score, FLOOR);
    }

    #[test]
    fn test_monotone_in_dispersion() {
        let tight = reliability_score(&[9.5, 10.0, 10.5]);
        let loose = reliability_score(&[7.0, 10.0, 13.0]);
        assert!(tight > loose);
    }
}
