//! Profile validation gate
//!
//! Three staged checks run before a profile is released: session integrity
//! (completed, long enough, enough events), data quality (valid-event ratio),
//! and assessment strength (trait coverage and measurement reliability).
//! Stages run in order and the first failure wins, but every computed metric
//! is reported regardless of the verdict.

use crate::config::CANONICAL_TRAITS;
use crate::error::InferenceError;
use crate::normalizer::quantile;
use crate::reliability::reliability_score;
use crate::types::{FailedThreshold, SessionSummary, ValidationResult, ValidationThresholds};
use std::collections::BTreeMap;
use tracing::warn;

/// Minimum session duration accepted by the gate, in seconds
pub const MIN_SESSION_DURATION_SECONDS: f64 = 30.0;

/// Minimum number of canonical traits a profile must cover
pub const MIN_TRAIT_COVERAGE: usize = 3;

/// Confidence floor when exactly the minimum coverage is met
const CONFIDENCE_BASE: f64 = 0.7;

/// Confidence ceiling at full coverage
const CONFIDENCE_CEILING: f64 = 0.95;

/// Staged validation gate over a session and its computed trait scores
#[derive(Debug, Clone)]
pub struct ValidationGate {
    thresholds: ValidationThresholds,
}

impl ValidationGate {
    pub fn new(thresholds: ValidationThresholds) -> Self {
        Self { thresholds }
    }

    /// Run all three stages.
    ///
    /// `raw_values` are the raw metric values the profile was computed from;
    /// `scored_traits` the trait names that produced a score. The returned
    /// result always carries the full set of computed metrics, including the
    /// informational outlier ratio, even when a stage fails.
    pub fn evaluate(
        &self,
        summary: &SessionSummary,
        raw_values: &[f64],
        scored_traits: &[String],
    ) -> ValidationResult {
        let data_completeness = data_completeness(summary, self.thresholds.min_sample_size);
        let quality_score = quality_score(summary);
        let reliability = reliability_score(raw_values);
        let coverage = canonical_coverage(scored_traits);
        let confidence = confidence_level(coverage);

        let mut computed_metrics = BTreeMap::new();
        computed_metrics.insert("data_completeness".to_string(), data_completeness);
        computed_metrics.insert("quality_score".to_string(), quality_score);
        computed_metrics.insert("reliability_score".to_string(), reliability);
        computed_metrics.insert("confidence_level".to_string(), confidence);
        computed_metrics.insert("canonical_traits_scored".to_string(), coverage as f64);
        computed_metrics.insert("outlier_ratio".to_string(), outlier_ratio(raw_values));

        let failed = self
            .check_session_integrity(summary, data_completeness)
            .or_else(|| self.check_data_quality(quality_score))
            .or_else(|| self.check_assessment_strength(coverage, reliability));

        if let Some(threshold) = &failed {
            warn!(
                threshold = threshold.name.as_str(),
                required = threshold.required,
                actual = threshold.actual,
                "profile rejected by validation gate"
            );
        }

        ValidationResult {
            is_valid: failed.is_none(),
            failed_threshold: failed,
            computed_metrics,
        }
    }

    fn check_session_integrity(
        &self,
        summary: &SessionSummary,
        data_completeness: f64,
    ) -> Option<FailedThreshold> {
        if !summary.is_completed {
            return Some(FailedThreshold {
                name: "session_completed".to_string(),
                required: 1.0,
                actual: 0.0,
                message: "Session did not run to completion".to_string(),
                remediation_hint: "Complete the full session before requesting assessment"
                    .to_string(),
            });
        }

        if summary.duration_seconds < MIN_SESSION_DURATION_SECONDS {
            return Some(FailedThreshold {
                name: "min_session_duration".to_string(),
                required: MIN_SESSION_DURATION_SECONDS,
                actual: summary.duration_seconds,
                message: "Session too short for a meaningful assessment".to_string(),
                remediation_hint: "Engage with the session for at least 30 seconds".to_string(),
            });
        }

        // The event count is the gate; completeness is the reported metric
        if summary.event_count < self.thresholds.min_sample_size {
            return Some(FailedThreshold {
                name: "min_data_completeness".to_string(),
                required: self.thresholds.min_data_completeness,
                actual: data_completeness,
                message: "Insufficient data for reliable assessment".to_string(),
                remediation_hint: "Collect more behavioral data before requesting assessment"
                    .to_string(),
            });
        }

        None
    }

    fn check_data_quality(&self, quality_score: f64) -> Option<FailedThreshold> {
        if quality_score < self.thresholds.min_quality_score {
            return Some(FailedThreshold {
                name: "min_quality_score".to_string(),
                required: self.thresholds.min_quality_score,
                actual: quality_score,
                message: "Data quality below threshold".to_string(),
                remediation_hint: "Ensure high-quality behavioral data collection".to_string(),
            });
        }
        None
    }

    fn check_assessment_strength(
        &self,
        coverage: usize,
        reliability: f64,
    ) -> Option<FailedThreshold> {
        if coverage < MIN_TRAIT_COVERAGE {
            return Some(FailedThreshold {
                name: "min_trait_coverage".to_string(),
                required: MIN_TRAIT_COVERAGE as f64,
                actual: coverage as f64,
                message: "Too few trait dimensions could be assessed".to_string(),
                remediation_hint: "Complete more game types for comprehensive assessment"
                    .to_string(),
            });
        }

        if reliability < self.thresholds.min_reliability_score {
            return Some(FailedThreshold {
                name: "min_reliability_score".to_string(),
                required: self.thresholds.min_reliability_score,
                actual: reliability,
                message: "Measurement reliability below threshold".to_string(),
                remediation_hint: "Improve data collection consistency".to_string(),
            });
        }

        None
    }
}

/// Completeness percentage: captured events against the required sample
/// size, capped at 100
pub fn data_completeness(summary: &SessionSummary, min_sample_size: u32) -> f64 {
    if min_sample_size == 0 {
        return 100.0;
    }
    (summary.event_count as f64 / min_sample_size as f64 * 100.0).min(100.0)
}

/// Quality percentage: valid events over total events
pub fn quality_score(summary: &SessionSummary) -> f64 {
    if summary.event_count == 0 {
        return 0.0;
    }
    summary.valid_event_count as f64 / summary.event_count as f64 * 100.0
}

/// Confidence derived from canonical trait coverage: 0.7 at the floor,
/// growing 0.05 per covered trait, capped at 0.95
pub fn confidence_level(coverage: usize) -> f64 {
    (CONFIDENCE_BASE + coverage as f64 / CANONICAL_TRAITS.len() as f64 * 0.25)
        .min(CONFIDENCE_CEILING)
}

fn canonical_coverage(scored_traits: &[String]) -> usize {
    CANONICAL_TRAITS
        .iter()
        .filter(|name| scored_traits.iter().any(|t| t == *name))
        .count()
}

/// Convert a failed gate threshold into the matching typed error
pub fn gate_error(failed: FailedThreshold) -> InferenceError {
    let FailedThreshold {
        name,
        required,
        actual,
        message,
        remediation_hint,
    } = failed;

    match name.as_str() {
        "min_quality_score" => InferenceError::DataQuality {
            threshold: name,
            required,
            actual,
            message,
            remediation_hint,
        },
        "min_trait_coverage" => InferenceError::TraitCoverage {
            threshold: name,
            required,
            actual,
            message,
            remediation_hint,
        },
        "min_reliability_score" => InferenceError::Reliability {
            threshold: name,
            required,
            actual,
            message,
            remediation_hint,
        },
        _ => InferenceError::InsufficientData {
            threshold: name,
            required,
            actual,
            message,
            remediation_hint,
        },
    }
}

/// Fraction of values outside the Tukey fences (1.5 IQR past the quartiles).
/// Informational only, never a release gate.
fn outlier_ratio(values: &[f64]) -> f64 {
    if values.len() < 4 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    let outliers = sorted.iter().filter(|v| **v < lower || **v > upper).count();
    outliers as f64 / sorted.len() as f64
}
