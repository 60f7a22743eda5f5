//! Scientific parameter registry
//!
//! Holds named, research-sourced constants with validated ranges. Updates
//! follow a copy-validate-commit sequence behind a write lock: a rejected
//! value never touches the stored parameter, and no reader can observe a
//! half-applied update.

use crate::error::InferenceError;
use crate::types::ScientificParameter;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::{info, warn};

/// Process-wide registry of scientific parameters
#[derive(Debug)]
pub struct ParameterRegistry {
    parameters: RwLock<BTreeMap<String, ScientificParameter>>,
}

impl Default for ParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterRegistry {
    /// Create a registry populated with the research-derived defaults
    pub fn new() -> Self {
        Self {
            parameters: RwLock::new(default_parameters()),
        }
    }

    /// Create a registry from an explicit parameter set (used by import)
    pub fn from_parameters(
        parameters: BTreeMap<String, ScientificParameter>,
    ) -> Result<Self, InferenceError> {
        validate_parameters(&parameters)?;
        Ok(Self {
            parameters: RwLock::new(parameters),
        })
    }

    /// Get a parameter by key, or `None` if unknown
    pub fn get(&self, key: &str) -> Option<ScientificParameter> {
        self.read_guard().get(key).cloned()
    }

    /// Set a parameter value with range validation.
    ///
    /// Rejects when the value falls outside `[min_value, max_value]`; on
    /// rejection the prior value is retained and the error reports the
    /// attempted value and the valid range.
    pub fn set(&self, key: &str, value: f64) -> Result<(), InferenceError> {
        let mut parameters = self.write_guard();

        let parameter = parameters
            .get_mut(key)
            .ok_or_else(|| InferenceError::UnknownEntity(format!("parameter: {key}")))?;

        if !parameter.accepts(value) {
            warn!(
                parameter = key,
                attempted = value,
                min = parameter.min_value,
                max = parameter.max_value,
                "rejected parameter update"
            );
            return Err(InferenceError::Configuration {
                errors: vec![format!(
                    "value {} for parameter {} outside valid range [{}, {}]",
                    value, key, parameter.min_value, parameter.max_value
                )],
            });
        }

        let old_value = parameter.value;
        parameter.value = value;
        parameter.last_updated = Utc::now().to_rfc3339();
        info!(parameter = key, from = old_value, to = value, "updated parameter");
        Ok(())
    }

    /// Registered parameter names
    pub fn names(&self) -> Vec<String> {
        self.read_guard().keys().cloned().collect()
    }

    /// Consistent snapshot of the full parameter set
    pub fn export(&self) -> BTreeMap<String, ScientificParameter> {
        self.read_guard().clone()
    }

    /// Replace the full parameter set after revalidation (all-or-nothing)
    pub fn replace_all(
        &self,
        parameters: BTreeMap<String, ScientificParameter>,
    ) -> Result<(), InferenceError> {
        validate_parameters(&parameters)?;
        *self.write_guard() = parameters;
        Ok(())
    }

    // Writes commit validated state in a single assignment, so a poisoned
    // lock still holds a consistent map; recover the guard.
    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, ScientificParameter>> {
        self.parameters.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, ScientificParameter>> {
        self.parameters.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Check every parameter's value against its declared range, collecting
/// every violation
pub(crate) fn validate_parameters(
    parameters: &BTreeMap<String, ScientificParameter>,
) -> Result<(), InferenceError> {
    let errors: Vec<String> = parameters
        .iter()
        .filter(|(_, p)| !p.is_in_range())
        .map(|(key, p)| {
            format!(
                "parameter {} value {} outside [{}, {}]",
                key, p.value, p.min_value, p.max_value
            )
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(InferenceError::Configuration { errors })
    }
}

/// Research-derived default parameters
fn default_parameters() -> BTreeMap<String, ScientificParameter> {
    let mut parameters = BTreeMap::new();

    parameters.insert(
        "bart_population_mean_pumps".to_string(),
        ScientificParameter {
            name: "BART Population Mean Pumps".to_string(),
            value: 30.5,
            min_value: 15.0,
            max_value: 50.0,
            description: "Population mean for average pumps in the balloon risk task".to_string(),
            research_basis: "Lejuez et al. (2002) - Balloon Analogue Risk Task".to_string(),
            validation_studies: vec![
                "Lejuez et al. (2002) - Evaluation of a behavioral measure of risk taking"
                    .to_string(),
                "Hunt et al. (2005) - Construct validity of the balloon analogue risk task"
                    .to_string(),
            ],
            last_updated: String::new(),
        },
    );

    parameters.insert(
        "bart_population_std_pumps".to_string(),
        ScientificParameter {
            name: "BART Population Standard Deviation".to_string(),
            value: 12.8,
            min_value: 5.0,
            max_value: 25.0,
            description: "Population standard deviation for balloon risk task pumps".to_string(),
            research_basis: "Meta-analysis of BART studies".to_string(),
            validation_studies: vec![
                "Lauriola & Levin (2001) - Individual differences in risky choice".to_string(),
            ],
            last_updated: String::new(),
        },
    );

    parameters.insert(
        "learning_rate_alpha".to_string(),
        ScientificParameter {
            name: "Learning Rate Alpha".to_string(),
            value: 0.15,
            min_value: 0.01,
            max_value: 0.5,
            description: "Learning rate parameter for reinforcement learning models".to_string(),
            research_basis: "Sutton & Barto (1998) - Reinforcement Learning".to_string(),
            validation_studies: vec![
                "Rescorla & Wagner (1972) - A theory of Pavlovian conditioning".to_string(),
                "Daw et al. (2006) - Cortical substrates for exploratory decisions".to_string(),
            ],
            last_updated: String::new(),
        },
    );

    parameters.insert(
        "attention_threshold_ms".to_string(),
        ScientificParameter {
            name: "Attention Threshold (ms)".to_string(),
            value: 500.0,
            min_value: 100.0,
            max_value: 2000.0,
            description: "Reaction time threshold for sustained attention".to_string(),
            research_basis: "Posner & Petersen (1990) - Attention systems".to_string(),
            validation_studies: vec![
                "Fan et al. (2002) - Testing the efficiency of attentional networks".to_string(),
            ],
            last_updated: String::new(),
        },
    );

    parameters.insert(
        "emotion_recovery_threshold".to_string(),
        ScientificParameter {
            name: "Emotion Recovery Threshold".to_string(),
            value: 5.0,
            min_value: 1.0,
            max_value: 15.0,
            description: "Time threshold for emotional recovery (seconds)".to_string(),
            research_basis: "Gross (1998) - Emotion regulation strategies".to_string(),
            validation_studies: vec![
                "Ochsner & Gross (2005) - The cognitive control of emotion".to_string(),
                "Sheppes & Gross (2011) - Selection of emotion regulation strategies".to_string(),
            ],
            last_updated: String::new(),
        },
    );

    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_in_range() {
        let registry = ParameterRegistry::new();
        for key in registry.names() {
            let param = registry.get(&key).unwrap();
            assert!(param.is_in_range(), "{key} default outside range");
        }
    }

    #[test]
    fn test_set_valid_value() {
        let registry = ParameterRegistry::new();
        registry.set("bart_population_mean_pumps", 28.0).unwrap();

        let param = registry.get("bart_population_mean_pumps").unwrap();
        assert_eq!(param.value, 28.0);
        assert!(!param.last_updated.is_empty());
    }

    #[test]
    fn test_set_out_of_range_retains_prior_value() {
        let registry = ParameterRegistry::new();
        let before = registry.get("bart_population_mean_pumps").unwrap().value;

        let result = registry.set("bart_population_mean_pumps", 99.0);
        assert!(matches!(
            result,
            Err(InferenceError::Configuration { .. })
        ));

        let after = registry.get("bart_population_mean_pumps").unwrap().value;
        assert_eq!(before, after);
    }

    #[test]
    fn test_set_rejects_non_finite() {
        let registry = ParameterRegistry::new();
        assert!(registry.set("learning_rate_alpha", f64::NAN).is_err());
        assert!(registry.set("learning_rate_alpha", f64::INFINITY).is_err());
    }

    #[test]
    fn test_set_unknown_parameter() {
        let registry = ParameterRegistry::new();
        let result = registry.set("does_not_exist", 1.0);
        assert!(matches!(result, Err(InferenceError::UnknownEntity(_))));
    }

    #[test]
    fn test_rejection_reports_attempted_value_and_range() {
        let registry = ParameterRegistry::new();
        let err = registry.set("learning_rate_alpha", 0.9).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("0.9"));
        assert!(message.contains("0.01"));
        assert!(message.contains("0.5"));
    }

    #[test]
    fn test_concurrent_sets_never_expose_out_of_range_value() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(ParameterRegistry::new());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for j in 0..50 {
                        // Alternate valid updates with ones that must be rejected
                        let value = if (i + j) % 2 == 0 {
                            20.0 + (i % 5) as f64
                        } else {
                            999.0
                        };
                        let _ = registry.set("bart_population_mean_pumps", value);

                        let observed = registry.get("bart_population_mean_pumps").unwrap();
                        assert!(observed.is_in_range(), "reader saw {}", observed.value);
                    }
                })
            })
            .collect();

        for writer in writers {
            writer.join().unwrap();
        }

        assert!(registry.get("bart_population_mean_pumps").unwrap().is_in_range());
    }

    #[test]
    fn test_replace_all_is_all_or_nothing() {
        let registry = ParameterRegistry::new();
        let mut candidate = registry.export();
        candidate
            .get_mut("learning_rate_alpha")
            .unwrap()
            .value = 5.0; // outside [0.01, 0.5]

        assert!(registry.replace_all(candidate).is_err());
        // Prior state retained
        assert_eq!(registry.get("learning_rate_alpha").unwrap().value, 0.15);
    }
}
