//! Inference orchestration
//!
//! The engine owns the parameter and trait configuration registries and
//! drives one inference call end to end: per-trait normalization and
//! aggregation, the staged validation gate, and profile assembly. Traits
//! without contributing metrics, and traits whose minimum sample size the
//! session does not meet, are excluded from the profile rather than scored.

use crate::aggregator::aggregate;
use crate::config::{validate_all, validate_thresholds, IntegrityReport, TraitConfigRegistry};
use crate::error::InferenceError;
use crate::normalizer::{normalize, NormalizationContext};
use crate::params::{validate_parameters, ParameterRegistry};
use crate::snapshot::{EngineSnapshot, ImportMode};
use crate::types::{
    InferenceRequest, NormalizationMethod, ReliabilityInfo, TraitConfiguration, TraitProfile,
    TraitScore, ValidationResult,
};
use crate::validation::{gate_error, ValidationGate};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::{debug, info};
use uuid::Uuid;

// Population statistics for z-score normalization of balloon task pump
// counts (Lejuez et al. norms, held in the parameter registry).
const BART_MEAN_KEY: &str = "bart_population_mean_pumps";
const BART_STD_KEY: &str = "bart_population_std_pumps";

/// The trait inference engine.
///
/// Stateless across calls apart from its registries: every `infer` call reads
/// a consistent snapshot of the configuration and produces an independent
/// profile.
#[derive(Debug, Default)]
pub struct TraitInferenceEngine {
    parameters: ParameterRegistry,
    configs: TraitConfigRegistry,
}

impl TraitInferenceEngine {
    /// Create an engine with the research-derived default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Scientific parameter registry
    pub fn parameters(&self) -> &ParameterRegistry {
        &self.parameters
    }

    /// Trait configuration registry
    pub fn trait_configs(&self) -> &TraitConfigRegistry {
        &self.configs
    }

    /// Infer a validated trait profile from one session's metrics.
    ///
    /// Every enabled trait with at least one contributing metric is scored;
    /// the staged validation gate then decides whether the profile may be
    /// released. A rejected session returns a typed error carrying the failed
    /// threshold and a remediation hint.
    pub fn infer(&self, request: &InferenceRequest) -> Result<TraitProfile, InferenceError> {
        let mut trait_scores = BTreeMap::new();
        for config in self.configs.list_enabled() {
            if request.session_summary.event_count < config.min_sample_size {
                debug!(
                    trait_name = config.trait_name.as_str(),
                    required = config.min_sample_size,
                    actual = request.session_summary.event_count,
                    "trait excluded, session below minimum sample size"
                );
                continue;
            }
            if let Some(score) = self.score_trait(&config, &request.metrics) {
                trait_scores.insert(config.trait_name.clone(), score);
            }
        }

        let result = self.validate(request, &trait_scores);
        if let Some(failed) = result.failed_threshold {
            return Err(gate_error(failed));
        }

        let metric = |key: &str| result.computed_metrics.get(key).copied().unwrap_or(0.0);
        let profile = TraitProfile {
            profile_id: Uuid::new_v4(),
            session_id: request.session_id.clone(),
            confidence_level: metric("confidence_level"),
            reliability_score: metric("reliability_score"),
            data_completeness: metric("data_completeness"),
            quality_score: metric("quality_score"),
            trait_scores,
            timestamp: Utc::now(),
        };

        info!(
            session_id = request.session_id.as_str(),
            profile_id = %profile.profile_id,
            traits = profile.trait_scores.len(),
            confidence = profile.confidence_level,
            "inferred trait profile"
        );
        Ok(profile)
    }

    /// Run the validation gate without releasing a profile.
    ///
    /// Useful for callers that want the computed metrics and verdict ahead of
    /// a full inference call.
    pub fn validate_request(&self, request: &InferenceRequest) -> ValidationResult {
        let mut trait_scores = BTreeMap::new();
        for config in self.configs.list_enabled() {
            if request.session_summary.event_count < config.min_sample_size {
                continue;
            }
            if let Some(score) = self.score_trait(&config, &request.metrics) {
                trait_scores.insert(config.trait_name.clone(), score);
            }
        }
        self.validate(request, &trait_scores)
    }

    /// Infer from a JSON-encoded request, returning the profile as JSON
    pub fn infer_json(&self, json: &str) -> Result<String, InferenceError> {
        let request: InferenceRequest = serde_json::from_str(json)?;
        let profile = self.infer(&request)?;
        Ok(serde_json::to_string(&profile)?)
    }

    /// Reliability and validity metadata for a trait
    pub fn reliability_info(&self, trait_name: &str) -> Result<ReliabilityInfo, InferenceError> {
        self.configs.reliability_info(trait_name)
    }

    /// Integrity report over the stored trait configurations
    pub fn validate_integrity(&self) -> IntegrityReport {
        self.configs.validate_integrity()
    }

    /// Snapshot the engine's full tunable state
    pub fn export_snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            engine_version: crate::ENGINE_VERSION.to_string(),
            exported_at: Utc::now(),
            parameters: self.parameters.export(),
            trait_configs: self.configs.export(),
            thresholds: self.configs.thresholds(),
        }
    }

    /// Import a snapshot, either merging over or replacing the current state.
    ///
    /// The candidate state is validated in full before anything is applied;
    /// on any violation the engine is left untouched.
    pub fn import_snapshot(
        &self,
        snapshot: EngineSnapshot,
        mode: ImportMode,
    ) -> Result<(), InferenceError> {
        let (parameters, trait_configs) = match mode {
            ImportMode::Replace => (snapshot.parameters, snapshot.trait_configs),
            ImportMode::Merge => {
                let mut parameters = self.parameters.export();
                parameters.extend(snapshot.parameters);
                let mut trait_configs = self.configs.export();
                trait_configs.extend(snapshot.trait_configs);
                (parameters, trait_configs)
            }
        };

        validate_parameters(&parameters)?;
        validate_all(&trait_configs)?;
        validate_thresholds(&snapshot.thresholds)?;

        self.parameters.replace_all(parameters)?;
        self.configs.replace_all(trait_configs)?;
        self.configs.set_thresholds(snapshot.thresholds)?;

        info!(?mode, "imported engine snapshot");
        Ok(())
    }

    fn validate(
        &self,
        request: &InferenceRequest,
        trait_scores: &BTreeMap<String, TraitScore>,
    ) -> ValidationResult {
        let raw_values: Vec<f64> = request.metrics.values().copied().collect();
        let scored: Vec<String> = trait_scores.keys().cloned().collect();
        let gate = ValidationGate::new(self.configs.thresholds());
        gate.evaluate(&request.session_summary, &raw_values, &scored)
    }

    /// Normalize and aggregate the source metrics of one trait.
    ///
    /// The normalization context comes from the trait's own sample values;
    /// balloon-task pump counts are z-scored against the registered
    /// population statistics instead.
    fn score_trait(
        &self,
        config: &TraitConfiguration,
        metrics: &BTreeMap<String, f64>,
    ) -> Option<TraitScore> {
        let samples: Vec<f64> = config
            .source_metrics
            .iter()
            .filter_map(|key| metrics.get(key).copied())
            .collect();
        if samples.is_empty() {
            return None;
        }

        let sample_context = NormalizationContext::from_samples(&samples);
        let population_context = self.population_context(config, &sample_context);

        let normalized: BTreeMap<String, f64> = config
            .source_metrics
            .iter()
            .filter_map(|key| {
                let raw = metrics.get(key)?;
                let context = match &population_context {
                    Some(context) if key.ends_with("average_pumps") => context,
                    _ => &sample_context,
                };
                Some((
                    key.clone(),
                    normalize(config.normalization_method, *raw, context),
                ))
            })
            .collect();

        aggregate(config, &normalized)
    }

    fn population_context(
        &self,
        config: &TraitConfiguration,
        base: &NormalizationContext,
    ) -> Option<NormalizationContext> {
        if config.normalization_method != NormalizationMethod::ZScore {
            return None;
        }
        let mean = self.parameters.get(BART_MEAN_KEY)?;
        let std = self.parameters.get(BART_STD_KEY)?;
        Some(base.clone().with_population(mean.value, std.value))
    }
}
