//! Trait score aggregation
//!
//! Combines the normalized source metrics of a trait into a single score
//! using the configured weighting model. A trait with no contributing metrics
//! is excluded from the profile rather than scored at zero.

use crate::types::{TraitConfiguration, TraitScore, WeightFunction};
use std::collections::BTreeMap;

// Role weights for the emotion regulation model: stress response and
// recovery time count inverted, post-loss stability counts direct.
const EMOTION_STRESS_WEIGHT: f64 = 0.35;
const EMOTION_RECOVERY_WEIGHT: f64 = 0.45;
const EMOTION_STABILITY_WEIGHT: f64 = 0.2;

// Role weights for the decision quality model, plus the penalty applied
// when speed outruns accuracy.
const DECISION_SPEED_WEIGHT: f64 = 0.3;
const DECISION_CONSISTENCY_WEIGHT: f64 = 0.3;
const DECISION_ACCURACY_WEIGHT: f64 = 0.4;
const SPEED_ACCURACY_PENALTY: f64 = 0.15;

/// Aggregate the normalized metrics for one trait.
///
/// `normalized` maps metric keys to values already on the [0,1] scale. Only
/// metrics named in the configuration's `source_metrics` contribute, in the
/// configured order. Returns `None` when none of them are present.
pub fn aggregate(
    config: &TraitConfiguration,
    normalized: &BTreeMap<String, f64>,
) -> Option<TraitScore> {
    let present: Vec<(usize, f64)> = config
        .source_metrics
        .iter()
        .enumerate()
        .filter_map(|(index, key)| normalized.get(key).map(|value| (index, *value)))
        .collect();

    if present.is_empty() {
        return None;
    }

    let raw_aggregate = match config.weight_function {
        WeightFunction::WeightedAverage => {
            positional_average(&present, config.source_metrics.len(), Order::Declining)
        }
        WeightFunction::LearningCurveAnalysis => {
            positional_average(&present, config.source_metrics.len(), Order::Increasing)
        }
        WeightFunction::EmotionRegulationModel => emotion_regulation(&present),
        WeightFunction::DecisionQualityModel => decision_quality(&present),
    };

    Some(TraitScore {
        trait_name: config.trait_name.clone(),
        raw_aggregate,
        normalized_score: raw_aggregate.clamp(0.0, 1.0),
        contributing_metric_count: present.len() as u32,
    })
}

enum Order {
    /// Earlier source metrics weigh more (primary metric first)
    Declining,
    /// Later source metrics weigh more (improvement over the session)
    Increasing,
}

/// Weighted mean with linear positional weights, normalized over the
/// metrics actually present
fn positional_average(present: &[(usize, f64)], total: usize, order: Order) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for (index, value) in present {
        let weight = match order {
            Order::Declining => (total - index) as f64,
            Order::Increasing => (index + 1) as f64,
        };
        weighted_sum += weight * value;
        weight_sum += weight;
    }

    weighted_sum / weight_sum
}

/// Emotion regulation: low stress response and fast recovery are the
/// regulated outcomes, so those two contribute inverted
fn emotion_regulation(present: &[(usize, f64)]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for (index, value) in present {
        let (weight, contribution) = match index {
            0 => (EMOTION_STRESS_WEIGHT, 1.0 - value),
            1 => (EMOTION_RECOVERY_WEIGHT, 1.0 - value),
            _ => (EMOTION_STABILITY_WEIGHT, *value),
        };
        weighted_sum += weight * contribution;
        weight_sum += weight;
    }

    weighted_sum / weight_sum
}

/// Decision quality: weighted mean of speed, consistency, and accuracy,
/// with a penalty when speed outruns accuracy (impulsive responding)
fn decision_quality(present: &[(usize, f64)]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    let mut speed = None;
    let mut accuracy = None;

    for (index, value) in present {
        let weight = match index {
            0 => {
                speed = Some(*value);
                DECISION_SPEED_WEIGHT
            }
            1 => DECISION_CONSISTENCY_WEIGHT,
            _ => {
                accuracy = Some(*value);
                DECISION_ACCURACY_WEIGHT
            }
        };
        weighted_sum += weight * value;
        weight_sum += weight;
    }

    let mut score = weighted_sum / weight_sum;
    if let (Some(speed), Some(accuracy)) = (speed, accuracy) {
        score -= SPEED_ACCURACY_PENALTY * (speed - accuracy).max(0.0);
    }
    score
}
