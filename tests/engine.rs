//! End-to-end inference tests against the public API

use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use trait_engine::{
    EngineSnapshot, ImportMode, InferenceError, InferenceRequest, SessionSummary, TraitInferenceEngine,
    TraitLevel, CANONICAL_TRAITS,
};

fn metrics(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), *value))
        .collect()
}

/// A realistic session: four game-derived metric groups, tight dispersion
fn good_request() -> InferenceRequest {
    InferenceRequest {
        session_id: "sess-e2e".to_string(),
        metrics: metrics(&[
            ("balloon_risk_risk_tolerance_average_pumps", 32.0),
            ("balloon_risk_risk_tolerance_risk_escalation", 30.0),
            ("balloon_risk_consistency_behavioral_consistency", 31.0),
            ("balloon_risk_learning_adaptation_rate", 29.5),
            ("balloon_risk_learning_learning_curve", 30.5),
            ("balloon_risk_learning_feedback_response", 31.5),
            ("memory_cards_learning_improvement_rate", 30.0),
            ("balloon_risk_emotion_stress_response", 29.0),
            ("balloon_risk_emotion_recovery_time", 30.0),
            ("balloon_risk_emotion_post_loss_behavior", 32.0),
            ("balloon_risk_decision_making_decision_speed", 31.0),
            ("reaction_timer_decision_making_response_accuracy", 30.0),
        ]),
        session_summary: SessionSummary {
            is_completed: true,
            duration_seconds: 240.0,
            event_count: 15,
            valid_event_count: 12,
        },
    }
}

#[test]
fn full_session_produces_validated_profile() {
    let engine = TraitInferenceEngine::new();
    let profile = engine.infer(&good_request()).unwrap();

    assert_eq!(profile.quality_score, 80.0);
    assert_eq!(profile.data_completeness, 100.0);
    assert!((profile.confidence_level - 0.9).abs() < 1e-12);
    assert!(profile.reliability_score >= 75.0);

    // Every scored trait is canonical, bounded, and interpretable
    assert_eq!(profile.trait_scores.len(), 4);
    for (name, score) in &profile.trait_scores {
        assert!(CANONICAL_TRAITS.contains(&name.as_str()));
        assert!((0.0..=1.0).contains(&score.normalized_score));
        let _level: TraitLevel = score.level();
    }
}

#[test]
fn sparse_session_is_rejected_with_remediation() {
    let engine = TraitInferenceEngine::new();
    let mut request = good_request();
    request.session_summary.event_count = 3;
    request.session_summary.valid_event_count = 3;

    let err = engine.infer(&request).unwrap_err();
    match &err {
        InferenceError::InsufficientData {
            threshold, actual, ..
        } => {
            assert_eq!(threshold, "min_data_completeness");
            assert_eq!(*actual, 30.0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.remediation_hint().unwrap().contains("Collect more"));
}

#[test]
fn incomplete_session_is_rejected() {
    let engine = TraitInferenceEngine::new();
    let mut request = good_request();
    request.session_summary.is_completed = false;

    let err = engine.infer(&request).unwrap_err();
    assert_eq!(err.failed_threshold(), Some("session_completed"));
}

#[test]
fn noisy_metrics_fail_reliability() {
    let engine = TraitInferenceEngine::new();
    let mut request = good_request();
    for (index, value) in request.metrics.values_mut().enumerate() {
        *value = if index % 2 == 0 { 1.0 } else { 120.0 };
    }

    let err = engine.infer(&request).unwrap_err();
    assert!(matches!(err, InferenceError::Reliability { .. }));
}

#[test]
fn missing_metric_groups_reduce_coverage_until_rejection() {
    let engine = TraitInferenceEngine::new();
    let mut request = good_request();
    request
        .metrics
        .retain(|key, _| key.starts_with("balloon_risk_risk_tolerance"));

    // Only risk_tolerance can be scored, below the three-trait floor
    let err = engine.infer(&request).unwrap_err();
    match err {
        InferenceError::TraitCoverage { actual, .. } => assert_eq!(actual, 1.0),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rejected_parameter_update_leaves_engine_behavior_unchanged() {
    let engine = TraitInferenceEngine::new();
    let before = engine.infer(&good_request()).unwrap();

    assert!(engine
        .parameters()
        .set("bart_population_mean_pumps", 500.0)
        .is_err());

    let after = engine.infer(&good_request()).unwrap();
    for (name, score) in &before.trait_scores {
        assert_eq!(
            score.normalized_score,
            after.trait_scores[name].normalized_score
        );
    }
}

#[test]
fn snapshot_replace_transfers_tuned_state() {
    let source = TraitInferenceEngine::new();
    source
        .parameters()
        .set("bart_population_mean_pumps", 28.0)
        .unwrap();
    let mut config = source.trait_configs().get("attention").unwrap();
    config.min_sample_size = 12;
    source.trait_configs().update("attention", config).unwrap();

    let json = source.export_snapshot().to_json().unwrap();
    let snapshot = EngineSnapshot::from_json(&json).unwrap();

    let target = TraitInferenceEngine::new();
    target.import_snapshot(snapshot, ImportMode::Replace).unwrap();

    assert_eq!(
        target
            .parameters()
            .get("bart_population_mean_pumps")
            .unwrap()
            .value,
        28.0
    );
    assert_eq!(
        target.trait_configs().get("attention").unwrap().min_sample_size,
        12
    );

    // The lowered attention floor brings the fifth trait into a 15-event
    // session; the metrics still only cover four trait groups here
    let profile = target.infer(&good_request()).unwrap();
    assert_eq!(profile.trait_scores.len(), 4);
}

#[test]
fn integrity_report_is_clean_on_defaults() {
    let engine = TraitInferenceEngine::new();
    let report = engine.validate_integrity();
    assert!(report.valid);
    assert!(report.errors.is_empty());
}

#[test]
fn reliability_info_exposes_published_evidence() {
    let engine = TraitInferenceEngine::new();
    let info = engine.reliability_info("emotion_regulation").unwrap();
    assert_eq!(info.reliability_coefficient, 0.75);
    assert!(!info.scientific_basis.is_empty());
}
