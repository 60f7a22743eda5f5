//! Trait Engine - Metric-to-trait inference for behavioral psychometric profiles
//!
//! The engine transforms per-session behavioral metric samples into validated
//! trait profiles through a deterministic pipeline: normalization →
//! aggregation → validation gate → profile assembly.
//!
//! ## Modules
//!
//! - **Registries**: Research-sourced scientific parameters and per-trait
//!   configurations, updated copy-validate-commit
//! - **Scoring**: Normalization methods and weighting models combining raw
//!   metrics into trait scores on a common [0,1] scale
//! - **Validation**: Staged release gate over session integrity, data
//!   quality, and assessment strength
//! - **Snapshots**: JSON export/import of the full tunable state

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod normalizer;
pub mod params;
pub mod reliability;
pub mod snapshot;
pub mod types;
pub mod validation;

pub use engine::TraitInferenceEngine;
pub use error::InferenceError;

// Registry exports
pub use config::{IntegrityReport, TraitConfigRegistry, CANONICAL_TRAITS};
pub use params::ParameterRegistry;

// Data model exports
pub use types::{
    FailedThreshold, InferenceRequest, MetricSample, NormalizationMethod, ReliabilityInfo,
    ScientificParameter, SessionSummary, TraitConfiguration, TraitLevel, TraitProfile, TraitScore,
    ValidationResult, ValidationThresholds, WeightFunction,
};

// Snapshot exports
pub use snapshot::{EngineSnapshot, ImportMode};

/// Engine version embedded in exported snapshots
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
