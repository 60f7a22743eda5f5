//! Error types for trait inference

use thiserror::Error;

/// Errors that can occur during configuration or inference.
///
/// All variants are recoverable by the caller: supply more data or fix the
/// configuration. Validation failures carry the threshold that was not met so
/// remediation is mechanical.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// A parameter or trait configuration update failed validation. The prior
    /// state is retained; nothing was applied.
    #[error("Invalid configuration: {}", errors.join("; "))]
    Configuration { errors: Vec<String> },

    /// Session is below the minimum event count or duration.
    #[error("{message} (required {required}, got {actual})")]
    InsufficientData {
        threshold: String,
        required: f64,
        actual: f64,
        message: String,
        remediation_hint: String,
    },

    /// Valid-event ratio below the quality threshold.
    #[error("{message} (required {required}, got {actual:.1})")]
    DataQuality {
        threshold: String,
        required: f64,
        actual: f64,
        message: String,
        remediation_hint: String,
    },

    /// Fewer than the required number of canonical traits could be scored.
    #[error("{message} (required {required}, got {actual})")]
    TraitCoverage {
        threshold: String,
        required: f64,
        actual: f64,
        message: String,
        remediation_hint: String,
    },

    /// Dispersion-derived reliability below the threshold.
    #[error("{message} (required {required}, got {actual:.1})")]
    Reliability {
        threshold: String,
        required: f64,
        actual: f64,
        message: String,
        remediation_hint: String,
    },

    /// Unknown trait or parameter name requested.
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl InferenceError {
    /// The name of the threshold that was not met, when applicable
    pub fn failed_threshold(&self) -> Option<&str> {
        match self {
            InferenceError::InsufficientData { threshold, .. }
            | InferenceError::DataQuality { threshold, .. }
            | InferenceError::TraitCoverage { threshold, .. }
            | InferenceError::Reliability { threshold, .. } => Some(threshold),
            _ => None,
        }
    }

    /// Caller-facing remediation hint, when applicable
    pub fn remediation_hint(&self) -> Option<&str> {
        match self {
            InferenceError::InsufficientData {
                remediation_hint, ..
            }
            | InferenceError::DataQuality {
                remediation_hint, ..
            }
            | InferenceError::TraitCoverage {
                remediation_hint, ..
            }
            | InferenceError::Reliability {
                remediation_hint, ..
            } => Some(remediation_hint),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = InferenceError::Configuration {
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Invalid configuration: a; b");
        assert!(err.failed_threshold().is_none());
    }

    #[test]
    fn test_threshold_accessors() {
        let err = InferenceError::DataQuality {
            threshold: "min_quality_score".to_string(),
            required: 70.0,
            actual: 55.5,
            message: "Data quality below threshold".to_string(),
            remediation_hint: "Ensure high-quality behavioral data collection".to_string(),
        };
        assert_eq!(err.failed_threshold(), Some("min_quality_score"));
        assert!(err.remediation_hint().unwrap().contains("high-quality"));
        assert!(err.to_string().contains("55.5"));
    }
}
