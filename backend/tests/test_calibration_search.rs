//! Calibration search and metric tests
//!
//! The search returns the upper end of a bracket around the smallest factor
//! reaching a kept goal. These tests check that the returned factor reaches
//! the goal (soundness), that a slightly smaller factor does not (minimality),
//! and how unreachable goals are reported.

use flow_calibration_core_rs::calibration::{
    calibrate, find_min_factor, flow_duration_metric, projected_capacity, CalibrationConfig,
};
use flow_calibration_core_rs::flow::{simulate, simulate_with_factor};
use flow_calibration_core_rs::models::{
    CalibrationEvent, CalibrationTarget, EventLog, FlowParameters, SearchBracket, SearchKind,
    SearchPhase,
};

fn base() -> FlowParameters {
    FlowParameters {
        total_items: 100,
        service_rate_coefficient: 0.05,
        passage_reduction: 1.0,
        expiry_mean: 10.0,
        expiry_jitter: 0.2,
        sample_max: 0,
        rng_seed: 42,
    }
}

fn kept_at(params: &FlowParameters, factor: f64) -> usize {
    simulate_with_factor(params, factor).kept_count
}

#[test]
fn test_search_is_sound_and_minimal() {
    let params = base();
    for goal in [1, 10, 51, 75, 100] {
        let mut log = EventLog::new();
        let outcome = find_min_factor(
            &params,
            goal,
            &SearchBracket::default(),
            SearchKind::MinKept,
            &mut log,
        );
        assert!(!outcome.reached_ceiling, "goal {}", goal);
        assert!(kept_at(&params, outcome.factor) >= goal, "goal {} not met", goal);
        assert!(
            kept_at(&params, outcome.factor * (1.0 - 1e-6)) < goal,
            "goal {} met below the returned factor",
            goal
        );
    }
}

#[test]
fn test_baseline_goal_needs_factor_at_most_one() {
    let params = base();
    let baseline = simulate(&params);
    let mut log = EventLog::new();
    let outcome = find_min_factor(
        &params,
        baseline.kept_count,
        &SearchBracket::default(),
        SearchKind::MinKept,
        &mut log,
    );
    assert!(outcome.factor <= 1.0);
}

#[test]
fn test_zero_goal_returns_one() {
    let mut log = EventLog::new();
    let outcome = find_min_factor(
        &base(),
        0,
        &SearchBracket::default(),
        SearchKind::LostTarget,
        &mut log,
    );
    assert_eq!(outcome.factor, 1.0);
    assert_eq!(outcome.evaluations, 0);
    assert_eq!(log.len(), 1);
    assert_eq!(log.events_of_type("SearchSkipped").len(), 1);
}

#[test]
fn test_small_goal_expands_lower_bound() {
    let mut log = EventLog::new();
    let outcome = find_min_factor(
        &base(),
        1,
        &SearchBracket::default(),
        SearchKind::MinKept,
        &mut log,
    );
    assert!(outcome.factor < 0.1);
    let lowered = log.events().iter().any(|e| {
        matches!(
            e,
            CalibrationEvent::Probe {
                phase: SearchPhase::LowerExpansion,
                ..
            }
        )
    });
    assert!(lowered);
}

#[test]
fn test_unreachable_goal_reports_ceiling() {
    // service time 1e9 dwarfs any expiry reachable after 20 doublings of 10
    let params = FlowParameters {
        total_items: 1,
        service_rate_coefficient: 0.0,
        ..base()
    };
    let mut log = EventLog::new();
    let outcome = find_min_factor(
        &params,
        1,
        &SearchBracket::default(),
        SearchKind::KeptFallback,
        &mut log,
    );

    assert!(outcome.reached_ceiling);
    assert_eq!(outcome.factor, 10.0 * 2f64.powi(20));
    assert_eq!(outcome.evaluations, 22);
    assert_eq!(log.probes_for(SearchKind::KeptFallback), 22);

    match log.events().last() {
        Some(CalibrationEvent::SearchFinished {
            reached_ceiling, ..
        }) => assert!(*reached_ceiling),
        other => panic!("expected SearchFinished, got {:?}", other),
    }
}

#[test]
fn test_goal_above_item_count_is_unreachable() {
    let mut log = EventLog::new();
    let outcome = find_min_factor(
        &base(),
        101,
        &SearchBracket::default(),
        SearchKind::KeptFallback,
        &mut log,
    );
    assert!(outcome.reached_ceiling);
}

#[test]
fn test_evaluations_within_budget() {
    let bracket = SearchBracket::default();
    let mut log = EventLog::new();
    let outcome = find_min_factor(&base(), 90, &bracket, SearchKind::MinKept, &mut log);
    assert!(outcome.evaluations <= bracket.max_evaluations());
    assert_eq!(outcome.evaluations, log.probes_for(SearchKind::MinKept));
}

#[test]
fn test_malformed_bracket_is_repaired() {
    let bracket = SearchBracket {
        low: -3.0,
        high: f64::NAN,
        ..SearchBracket::default()
    };
    let mut log = EventLog::new();
    let outcome = find_min_factor(&base(), 60, &bracket, SearchKind::MinKept, &mut log);
    assert!(!outcome.reached_ceiling);
    assert!(kept_at(&base(), outcome.factor) >= 60);
}

#[test]
fn test_calibrate_with_lost_target() {
    let params = base();
    let baseline = simulate(&params);
    let target = CalibrationTarget {
        min_kept: 60,
        exact_lost: Some(12),
    };
    let mut log = EventLog::new();
    let result = calibrate(
        &params,
        &baseline,
        &target,
        &CalibrationConfig::default(),
        &mut log,
    );

    assert_eq!(result.target_search.goal, 88);
    assert!(simulate_with_factor(&params, result.factor_for_target).lost_count <= 12);
    assert_eq!(
        result.projected_capacity,
        kept_at(&params, result.factor_for_min_kept)
    );
    assert!(result.projected_capacity >= 60);
    assert_eq!(result.kept_percentage, baseline.kept_percentage());
    assert!(log.probes_for(SearchKind::MinKept) > 0);
    assert!(log.probes_for(SearchKind::LostTarget) > 0);
    assert_eq!(log.probes_for(SearchKind::KeptFallback), 0);
}

#[test]
fn test_calibrate_fallback_target() {
    let params = FlowParameters {
        total_items: 400,
        ..base()
    };
    let baseline = simulate(&params);
    let target = CalibrationTarget {
        min_kept: 1,
        exact_lost: None,
    };
    let mut log = EventLog::new();
    let result = calibrate(
        &params,
        &baseline,
        &target,
        &CalibrationConfig::default(),
        &mut log,
    );

    assert_eq!(result.target_search.goal, baseline.kept_count * 4);
    assert!(log.probes_for(SearchKind::KeptFallback) > 0);
    if !result.target_search.reached_ceiling {
        assert!(kept_at(&params, result.factor_for_target) >= baseline.kept_count * 4);
    }
}

#[test]
fn test_projected_capacity_matches_run() {
    let params = base();
    assert_eq!(projected_capacity(&params, 1.0), simulate(&params).kept_count);
    assert_eq!(projected_capacity(&params, 1000.0), 100);
}

#[test]
fn test_flow_duration_metric() {
    // base life ½(10 + 6) = 8, center 16, edge 12 at factor 2
    let metric = flow_duration_metric(10.0, 6.0, 2.0, 0.25);
    assert!((metric - (16.0 * 0.75 + 12.0 * 0.25)).abs() < 1e-12);

    // no kept items: base life is the mean itself
    assert!((flow_duration_metric(10.0, 0.0, 1.0, 0.0) - 10.0).abs() < 1e-12);

    // share outside [0, 1] is clamped
    assert_eq!(
        flow_duration_metric(10.0, 6.0, 1.0, 3.0),
        flow_duration_metric(10.0, 6.0, 1.0, 1.0)
    );
}
