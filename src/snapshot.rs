//! Engine state snapshots
//!
//! A snapshot captures the complete tunable state of an engine: scientific
//! parameters, trait configurations, and release thresholds. Snapshots move
//! between deployments as JSON and are revalidated in full on import.

use crate::error::InferenceError;
use crate::types::{ScientificParameter, TraitConfiguration, ValidationThresholds};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Serializable snapshot of an engine's tunable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Version of the engine that produced the snapshot
    pub engine_version: String,
    /// When the snapshot was taken
    pub exported_at: DateTime<Utc>,
    /// Full scientific parameter set
    pub parameters: BTreeMap<String, ScientificParameter>,
    /// Full trait configuration set
    pub trait_configs: BTreeMap<String, TraitConfiguration>,
    /// Release thresholds
    pub thresholds: ValidationThresholds,
}

impl EngineSnapshot {
    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, InferenceError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to pretty-printed JSON for configuration files
    pub fn to_json_pretty(&self) -> Result<String, InferenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// How an imported snapshot combines with existing engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportMode {
    /// Snapshot entries overlay the current state key by key; entries the
    /// snapshot does not name are kept. The overlay unit is the whole entity:
    /// a named parameter or trait configuration replaces the stored one in
    /// full, individual fields are not merged.
    Merge,
    /// Snapshot state replaces the current state wholesale
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_snapshot_json_round_trip() {
        let snapshot = EngineSnapshot {
            engine_version: "0.1.0".to_string(),
            exported_at: Utc::now(),
            parameters: BTreeMap::new(),
            trait_configs: BTreeMap::new(),
            thresholds: ValidationThresholds::default(),
        };

        let json = snapshot.to_json().unwrap();
        let parsed = EngineSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed.engine_version, "0.1.0");
        assert_eq!(parsed.thresholds, ValidationThresholds::default());
    }

    #[test]
    fn test_import_mode_serialization() {
        assert_eq!(
            serde_json::to_string(&ImportMode::Merge).unwrap(),
            "\"merge\""
        );
        let parsed: ImportMode = serde_json::from_str("\"replace\"").unwrap();
        assert_eq!(parsed, ImportMode::Replace);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let result = EngineSnapshot::from_json("{not json");
        assert!(matches!(result, Err(InferenceError::JsonError(_))));
    }
}
