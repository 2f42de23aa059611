//! End-to-end pipeline tests
//!
//! Two runs of the same configuration must agree on everything except the
//! run id.

use flow_calibration_core_rs::models::{EventLog, SearchKind};
use flow_calibration_core_rs::orchestrator::{
    compute_config_hash, Pipeline, PipelineConfig, PipelineError, PipelineReport,
};

fn small_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.shape.fixed_depth = Some(1);
    config
}

fn run(config: PipelineConfig) -> PipelineReport {
    Pipeline::new(config).unwrap().run()
}

#[test]
fn test_runs_are_deterministic_except_run_id() {
    let a = run(small_config());
    let mut b = run(small_config());
    assert_ne!(a.run_id, b.run_id);
    b.run_id = a.run_id;
    assert_eq!(a, b);
}

#[test]
fn test_config_hash_stable_and_sensitive() {
    let a = Pipeline::new(small_config()).unwrap();
    let b = Pipeline::new(small_config()).unwrap();
    assert_eq!(a.config_hash(), b.config_hash());
    assert_eq!(a.config_hash().len(), 64);

    let mut other = small_config();
    other.retention_factor = 8;
    let c = Pipeline::new(other).unwrap();
    assert_ne!(a.config_hash(), c.config_hash());
}

#[test]
fn test_hash_covers_sanitized_config() {
    let mut wild = small_config();
    wild.retention_factor = 500;
    let mut capped = small_config();
    capped.retention_factor = 32;
    assert_eq!(
        Pipeline::new(wild).unwrap().config_hash(),
        Pipeline::new(capped).unwrap().config_hash()
    );
    assert_eq!(
        Pipeline::new(small_config()).unwrap().config_hash(),
        compute_config_hash(&small_config().sanitize()).unwrap()
    );
}

#[test]
fn test_report_is_consistent() {
    let report = run(small_config());

    assert_eq!(report.shape.depth, 1);
    assert_eq!(report.baseline.total_items, report.shape.total_vertices);
    assert_eq!(
        report.baseline.kept_count + report.baseline.lost_count,
        report.baseline.total_items
    );
    assert!(report.timeline.effective_replicas < report.shape.total_vertices);

    let targets = &report.targets;
    assert_eq!(targets.retention_factor, 4);
    assert_eq!(targets.target_lost, targets.lost_now / 4);
    assert_eq!(
        targets.target_kept_min,
        report.baseline.total_items - targets.target_lost
    );

    // projection runs at the target factor and leaves at most the lost target
    assert_eq!(report.projection.factor, report.calibration.factor_for_target);
    if !report.calibration.target_search.reached_ceiling {
        assert!(report.projection.lost <= targets.target_lost);
    }
    assert_eq!(
        report.search_evaluations,
        report.calibration.min_kept_search.evaluations
            + report.calibration.target_search.evaluations
    );
}

#[test]
fn test_log_records_both_searches() {
    let pipeline = Pipeline::new(small_config()).unwrap();
    let mut log = EventLog::new();
    let report = pipeline.run_with_log(&mut log);

    let min_kept_probes = log.probes_for(SearchKind::MinKept);
    let target_probes = log.probes_for(SearchKind::LostTarget);
    assert_eq!(min_kept_probes, report.calibration.min_kept_search.evaluations);
    assert_eq!(target_probes, report.calibration.target_search.evaluations);
    let finished = log.events_of_type("SearchFinished").len();
    let skipped = log.events_of_type("SearchSkipped").len();
    assert_eq!(finished + skipped, 2);
}

#[test]
fn test_explicit_target_overrides_retention() {
    let mut config = small_config();
    config.target = Some(flow_calibration_core_rs::models::CalibrationTarget {
        min_kept: 1,
        exact_lost: None,
    });
    let report = run(config);
    assert_eq!(report.calibration.min_kept_search.goal, 1);
    assert_eq!(
        report.calibration.target_search.goal,
        (report.baseline.kept_count * 4).max(1)
    );
}

#[test]
fn test_master_seed_changes_run() {
    let a = run(small_config().with_master_seed(1));
    let b = run(small_config().with_master_seed(2));
    assert_ne!(a.config_hash, b.config_hash);
    assert_ne!(a.shape.seed, b.shape.seed);
}

#[test]
fn test_rebound_goal_zero() {
    let mut config = small_config();
    config.rebound_goal = Some(0);
    let report = run(config);
    assert_eq!(report.overlay_inputs.subdivision_count, 1);
    assert_eq!(report.overlay.result.capacity, 0);
    assert_eq!(report.readable.read_window, 0.0);
    assert_eq!(report.readable.readable_capacity, 0);
}

#[test]
fn test_overlay_from_config_without_rebounds() {
    let mut config = small_config();
    config.overlay.subdivision_count = 5;
    config.overlay.target_scalar = 3.0;
    config.overlay.support_scalar = 0.0;
    config.overlay.maintenance_scalar = 5.0;
    let report = run(config);
    assert_eq!(report.overlay.result.active, 1);
    assert_eq!(report.overlay.result.disappeared, 2);
    assert_eq!(report.readable.read_window, 10.0);
}

#[test]
fn test_config_from_json() {
    let config = PipelineConfig::from_json_str(
        r#"{
            "shape": { "fixed_depth": 1 },
            "flow": { "expiry_mean": 25.0 },
            "rebound_goal": 2
        }"#,
    )
    .unwrap();
    assert_eq!(config.flow.expiry_mean, 25.0);
    assert_eq!(config.flow.service_rate_coefficient, 0.05);
    let report = run(config);
    assert_eq!(report.overlay.result.target, 2);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = small_config();
    config.flow.expiry_mean = 0.0;
    assert!(matches!(
        Pipeline::new(config),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn test_oversized_polygons_rejected() {
    let mut config = small_config();
    config.shape.min_sides = 12;
    config.shape.max_sides = 12;
    assert!(matches!(
        Pipeline::new(config),
        Err(PipelineError::InvalidConfig(_))
    ));
}

#[test]
fn test_rebound_goal_bounded_by_subdivision_limit() {
    let config = PipelineConfig::from_json_str(
        r#"{ "shape": { "fixed_depth": 1 }, "rebound_goal": 4000000000 }"#,
    )
    .unwrap();
    let report = run(config);
    assert_eq!(report.overlay_inputs.subdivision_count, 64);
    assert_eq!(report.overlay.slots.len(), 63);
}

#[test]
fn test_missing_config_file_is_io_error() {
    let err = PipelineConfig::from_path("/nonexistent/flowcal.json").unwrap_err();
    assert!(matches!(err, PipelineError::Io(_)));
}

#[test]
fn test_report_serializes() {
    let report = run(small_config());
    let json = serde_json::to_string(&report).unwrap();
    let back: PipelineReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.config_hash, report.config_hash);
    assert_eq!(back.baseline.kept_count, report.baseline.kept_count);
}
