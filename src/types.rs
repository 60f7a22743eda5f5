//! Core data model for trait inference
//!
//! This module defines the types that flow through the inference pipeline:
//! scientific parameters, trait configurations, metric samples, trait scores,
//! and the assembled trait profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A research-sourced scientific parameter with a validated range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScientificParameter {
    /// Human-readable parameter name
    pub name: String,
    /// Current value
    pub value: f64,
    /// Lower bound of the acceptable range (inclusive)
    pub min_value: f64,
    /// Upper bound of the acceptable range (inclusive)
    pub max_value: f64,
    /// What the parameter represents
    pub description: String,
    /// Primary research the value is derived from
    pub research_basis: String,
    /// Supporting validation studies
    #[serde(default)]
    pub validation_studies: Vec<String>,
    /// When the value was last changed (RFC3339), empty for defaults
    #[serde(default)]
    pub last_updated: String,
}

impl ScientificParameter {
    /// Whether the current value lies within the acceptable range
    pub fn is_in_range(&self) -> bool {
        self.min_value <= self.value && self.value <= self.max_value
    }

    /// Whether a candidate value would lie within the acceptable range
    pub fn accepts(&self, candidate: f64) -> bool {
        candidate.is_finite() && self.min_value <= candidate && candidate <= self.max_value
    }
}

/// Normalization method applied to a trait's source metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    ZScore,
    Sigmoid,
    RobustScaling,
    Percentile,
    MinMax,
}

/// Weighting model combining normalized metrics into one trait score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightFunction {
    WeightedAverage,
    LearningCurveAnalysis,
    EmotionRegulationModel,
    DecisionQualityModel,
}

/// Configuration for a single trait assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitConfiguration {
    /// Trait identifier (lower_snake_case)
    pub trait_name: String,
    /// Whether the orchestrator attempts this trait
    pub enabled: bool,
    /// Minimum per-trait confidence (0-1)
    pub confidence_threshold: f64,
    /// Minimum events required in the session
    pub min_sample_size: u32,
    /// Normalization applied to the source metrics
    pub normalization_method: NormalizationMethod,
    /// Weighting model combining the normalized metrics
    pub weight_function: WeightFunction,
    /// Metric keys this trait consumes (non-empty)
    pub source_metrics: Vec<String>,
    /// Published reliability coefficient (0-1)
    pub reliability_coefficient: f64,
    /// Methodology the mapping is based on
    #[serde(default)]
    pub scientific_basis: String,
    /// Published validity evidence for the mapping
    #[serde(default)]
    pub validity_evidence: String,
}

impl TraitConfiguration {
    /// Validate the configuration, collecting every violation
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            errors.push(format!(
                "confidence_threshold must be between 0.0 and 1.0 (got {})",
                self.confidence_threshold
            ));
        }
        if self.min_sample_size < 1 {
            errors.push("min_sample_size must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.reliability_coefficient) {
            errors.push(format!(
                "reliability_coefficient must be between 0.0 and 1.0 (got {})",
                self.reliability_coefficient
            ));
        }
        if self.source_metrics.is_empty() {
            errors.push("source_metrics cannot be empty".to_string());
        }

        errors
    }

    /// Reliability and validity metadata for reporting
    pub fn reliability_info(&self) -> ReliabilityInfo {
        ReliabilityInfo {
            reliability_coefficient: self.reliability_coefficient,
            validity_evidence: self.validity_evidence.clone(),
            scientific_basis: self.scientific_basis.clone(),
        }
    }
}

/// Reliability and validity metadata for a trait
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityInfo {
    pub reliability_coefficient: f64,
    pub validity_evidence: String,
    pub scientific_basis: String,
}

/// Release thresholds enforced by the validation gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationThresholds {
    /// Minimum data completeness percentage (0-100)
    pub min_data_completeness: f64,
    /// Minimum quality score percentage (0-100)
    pub min_quality_score: f64,
    /// Minimum reliability score (50-100)
    pub min_reliability_score: f64,
    /// Confidence interval level used for reporting
    pub confidence_interval_level: f64,
    /// Minimum events in a session
    pub min_sample_size: u32,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_data_completeness: 80.0,
            min_quality_score: 70.0,
            min_reliability_score: 75.0,
            confidence_interval_level: 0.95,
            min_sample_size: 10,
        }
    }
}

/// A single behavioral metric sample supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    /// Metric key, e.g. `balloon_risk_risk_tolerance_average_pumps`
    pub metric_key: String,
    /// Raw metric value
    pub value: f64,
    /// Unit or measurement context, if the producer supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_context: Option<String>,
}

/// Aggregate statistics of the session the metrics were extracted from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Whether the session ran to completion
    pub is_completed: bool,
    /// Session duration in seconds
    pub duration_seconds: f64,
    /// Total behavioral events captured
    pub event_count: u32,
    /// Events that passed upstream validation
    pub valid_event_count: u32,
}

/// Input to one inference invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Session identifier
    pub session_id: String,
    /// Metric key -> raw value, as extracted by the caller
    pub metrics: BTreeMap<String, f64>,
    /// Session-level statistics for the validation gate
    pub session_summary: SessionSummary,
}

impl InferenceRequest {
    /// Build a request from individual metric samples. Later samples with a
    /// duplicate key overwrite earlier ones.
    pub fn from_samples(
        session_id: impl Into<String>,
        samples: Vec<MetricSample>,
        session_summary: SessionSummary,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            metrics: samples
                .into_iter()
                .map(|sample| (sample.metric_key, sample.value))
                .collect(),
            session_summary,
        }
    }
}

/// Five-band interpretation of a trait score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitLevel {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl TraitLevel {
    /// Band a score in [0,1] into an interpretation level
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            TraitLevel::VeryHigh
        } else if score >= 0.6 {
            TraitLevel::High
        } else if score >= 0.4 {
            TraitLevel::Moderate
        } else if score >= 0.2 {
            TraitLevel::Low
        } else {
            TraitLevel::VeryLow
        }
    }
}

/// Score for a single trait, computed per inference call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitScore {
    /// Trait identifier
    pub trait_name: String,
    /// Weighted aggregate before clamping
    pub raw_aggregate: f64,
    /// Final score clamped to [0,1]
    pub normalized_score: f64,
    /// How many source metrics were present and contributed
    pub contributing_metric_count: u32,
}

impl TraitScore {
    /// Interpretation band for the normalized score
    pub fn level(&self) -> TraitLevel {
        TraitLevel::from_score(self.normalized_score)
    }
}

/// Validated multi-dimensional trait profile, produced once per successful call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitProfile {
    /// Unique profile identifier
    pub profile_id: uuid::Uuid,
    /// Session the profile was inferred from
    pub session_id: String,
    /// Trait name -> score
    pub trait_scores: BTreeMap<String, TraitScore>,
    /// Derived confidence level (0.7-0.95)
    pub confidence_level: f64,
    /// Dispersion-based reliability (50-100)
    pub reliability_score: f64,
    /// Data completeness percentage (0-100)
    pub data_completeness: f64,
    /// Valid-event ratio percentage (0-100)
    pub quality_score: f64,
    /// When the profile was assembled
    pub timestamp: DateTime<Utc>,
}

/// The threshold a validation stage failed on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedThreshold {
    /// Threshold name, e.g. `min_quality_score`
    pub name: String,
    /// Required bound
    pub required: f64,
    /// Observed value
    pub actual: f64,
    /// What went wrong
    pub message: String,
    /// How the caller can remediate
    pub remediation_hint: String,
}

/// Verdict of the validation gate, always produced before a profile is released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Whether the profile may be released
    pub is_valid: bool,
    /// Populated when a stage failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_threshold: Option<FailedThreshold>,
    /// Metrics computed along the way (completeness, quality, reliability, ...)
    pub computed_metrics: BTreeMap<String, f64>,
}
