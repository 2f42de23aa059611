//! Pipeline Engine
//!
//! Runs every stage of the process in order:
//!
//! ```text
//! 1. Generate the shape              → N vertices, depth r
//! 2. Generate the timeline           → effective replicas k (ratio N/k)
//! 3. Baseline flow run               → kept / lost
//! 4. Retention targets               → lost target = lost / retention_factor
//! 5. Calibration                     → factors, capacity, flow duration
//! 6. Projection at the target factor → readable window
//! 7. Structural overlay              → slot counts and persistence
//! ```
//!
//! # Example
//!
//! ```rust
//! use flow_calibration_core_rs::orchestrator::{Pipeline, PipelineConfig};
//!
//! let mut config = PipelineConfig::default();
//! config.shape.fixed_depth = Some(1);
//!
//! let pipeline = Pipeline::new(config).unwrap();
//! let report = pipeline.run();
//! assert_eq!(
//!     report.baseline.kept_count + report.baseline.lost_count,
//!     report.shape.total_vertices
//! );
//! ```

use crate::calibration::calibrate;
use crate::flow::{simulate, simulate_with_factor};
use crate::models::{
    CalibrationResult, CalibrationTarget, EventLog, FlowParameters, FlowResult, OverlayInputs,
    OverlayReport,
};
use crate::orchestrator::config::PipelineConfig;
use crate::orchestrator::fingerprint::compute_config_hash;
use crate::overlay::overlay_report;
use crate::shape::{Shape, ShapeGenerator};
use crate::timeline::generate_timeline;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Read-window margin applied when a rebound goal sets the window
const REBOUND_READ_MARGIN: f64 = 0.08;

/// Errors from configuring or serializing a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeSummary {
    pub seed: u64,
    pub depth: u32,
    pub total_vertices: usize,
    pub segments: usize,
    pub theoretical_max_vertices: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSummary {
    pub seed: u64,
    pub effective_replicas: usize,
    pub min_gap: f64,
    pub tau: f64,
    pub event_count: usize,
}

/// `T = N / k` and derived values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaRatio {
    /// `None` when no replica was drawn
    pub ratio: Option<f64>,
    pub inverse: f64,
    pub whole_part: u64,
}

impl ReplicaRatio {
    pub fn new(total_vertices: usize, effective_replicas: usize) -> Self {
        if effective_replicas == 0 {
            return Self {
                ratio: None,
                inverse: 0.0,
                whole_part: 0,
            };
        }
        let ratio = total_vertices as f64 / effective_replicas as f64;
        Self {
            ratio: Some(ratio),
            inverse: if ratio > 0.0 { 1.0 / ratio } else { 0.0 },
            whole_part: ratio.floor() as u64,
        }
    }
}

/// Lost/kept goals derived from the baseline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionTargets {
    pub retention_factor: u32,
    pub lost_now: usize,
    /// `lost_now / retention_factor`
    pub target_lost: usize,
    /// `lost_now - target_lost × retention_factor`
    pub lost_remainder: usize,
    /// `N - target_lost`
    pub target_kept_min: usize,
}

impl RetentionTargets {
    pub fn from_baseline(baseline: &FlowResult, retention_factor: u32) -> Self {
        let factor = retention_factor.max(1) as usize;
        let lost_now = baseline.lost_count;
        let target_lost = lost_now / factor;
        Self {
            retention_factor: factor as u32,
            lost_now,
            target_lost,
            lost_remainder: lost_now - target_lost * factor,
            target_kept_min: baseline.total_items.saturating_sub(target_lost),
        }
    }

    pub fn as_calibration_target(&self) -> CalibrationTarget {
        CalibrationTarget {
            min_kept: self.target_kept_min,
            exact_lost: Some(self.target_lost),
        }
    }
}

/// Flow run at the target factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub factor: f64,
    pub kept: usize,
    pub lost: usize,
    pub service_time: f64,
    pub service_time_seconds: f64,
}

/// How many projected items fit in the read window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadableWindow {
    pub read_window: f64,
    /// `floor(read_window / service_time)`
    pub readable_capacity: usize,
    pub center_share: f64,
    pub readable_center: usize,
    /// `min(projected kept, readable_center)`
    pub readable_effective: usize,
}

impl ReadableWindow {
    pub fn new(read_window: f64, projection: &Projection, edge_share: f64) -> Self {
        let center_share = 1.0 - edge_share.clamp(0.0, 1.0);
        let readable_capacity = (read_window / projection.service_time.max(1e-12)).floor() as usize;
        let readable_center = (readable_capacity as f64 * center_share).floor() as usize;
        Self {
            read_window,
            readable_capacity,
            center_share,
            readable_center,
            readable_effective: projection.kept.min(readable_center),
        }
    }
}

/// Everything a pipeline run computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub config_hash: String,
    pub shape: ShapeSummary,
    pub timeline: TimelineSummary,
    pub ratio: ReplicaRatio,
    pub baseline: FlowResult,
    pub targets: RetentionTargets,
    pub calibration: CalibrationResult,
    pub projection: Projection,
    pub readable: ReadableWindow,
    pub overlay_inputs: OverlayInputs,
    pub overlay: OverlayReport,
    /// Flow simulations issued by the calibration searches
    pub search_evaluations: usize,
}

// ============================================================================
// Pipeline
// ============================================================================

/// A validated configuration, ready to run
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    config_hash: String,
}

impl Pipeline {
    /// Sanitize and validate `config`
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when the search bracket or the shape settings cannot
    /// be used; `Serialization` if the config cannot be fingerprinted.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let config = config.sanitize();
        config.validate()?;
        let config_hash = compute_config_hash(&config)?;
        debug!(config_hash = %config_hash, "pipeline configured");
        Ok(Self {
            config,
            config_hash,
        })
    }

    /// Sanitized configuration this pipeline runs with
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Run every stage
    pub fn run(&self) -> PipelineReport {
        let mut log = EventLog::new();
        self.run_with_log(&mut log)
    }

    /// Run every stage, recording calibration probes in `log`
    pub fn run_with_log(&self, log: &mut EventLog) -> PipelineReport {
        let config = &self.config;

        let generated = ShapeGenerator::new(config.shape.clone()).generate();
        let total_vertices = generated.total_vertices().max(1);
        info!(
            depth = generated.depth,
            total_vertices, "shape generated"
        );

        let timeline = generate_timeline(&generated.shape, &config.timeline);
        let ratio = ReplicaRatio::new(total_vertices, timeline.effective_replicas);
        debug!(
            effective_replicas = timeline.effective_replicas,
            tau = timeline.tau,
            "timeline generated"
        );

        let params = self.flow_parameters(total_vertices, generated.depth);
        let baseline = simulate(&params);
        info!(
            kept = baseline.kept_count,
            lost = baseline.lost_count,
            service_time = baseline.service_time,
            "baseline flow"
        );

        let targets = RetentionTargets::from_baseline(&baseline, config.retention_factor);
        let target = config
            .target
            .clone()
            .unwrap_or_else(|| targets.as_calibration_target());

        let probes_before = log.len();
        let calibration = calibrate(&params, &baseline, &target, &config.calibration, log);
        let search_evaluations =
            calibration.min_kept_search.evaluations + calibration.target_search.evaluations;
        debug!(events = log.len() - probes_before, search_evaluations, "calibration logged");

        let projected = simulate_with_factor(&params, calibration.factor_for_target);
        let projection = Projection {
            factor: calibration.factor_for_target,
            kept: projected.kept_count,
            lost: projected.lost_count,
            service_time: projected.service_time,
            service_time_seconds: projected.service_time * config.tick_seconds,
        };

        let (overlay_inputs, read_window) = self.rebound_plan(&projection);
        let readable = ReadableWindow::new(read_window, &projection, config.calibration.edge_share);
        let overlay = overlay_report(&overlay_inputs);

        PipelineReport {
            run_id: Uuid::new_v4(),
            config_hash: self.config_hash.clone(),
            shape: summarize_shape(&generated.shape, generated.depth, config.shape.seed),
            timeline: TimelineSummary {
                seed: config.timeline.seed,
                effective_replicas: timeline.effective_replicas,
                min_gap: timeline.min_gap,
                tau: timeline.tau,
                event_count: timeline.events.len(),
            },
            ratio,
            baseline,
            targets,
            calibration,
            projection,
            readable,
            overlay_inputs,
            overlay,
            search_evaluations,
        }
    }

    fn flow_parameters(&self, total_vertices: usize, depth: u32) -> FlowParameters {
        let flow = &self.config.flow;
        FlowParameters {
            service_rate_coefficient: flow.service_rate_coefficient,
            expiry_mean: flow.expiry_mean,
            expiry_jitter: flow.expiry_jitter,
            sample_max: flow.sample_max,
            rng_seed: flow.seed,
            ..FlowParameters::for_shape(total_vertices, depth)
        }
    }

    /// Overlay inputs and read window, overridden by a rebound goal if one is set
    ///
    /// A goal of `R` rebounds asks for `R + 1` subdivisions with `R` target and
    /// `R` active slots, a maintenance budget of two service times in seconds,
    /// and a read window wide enough to read `R` items in the center share
    /// with an 8% margin. The slot spacing and recovery tag stay as configured.
    fn rebound_plan(&self, projection: &Projection) -> (OverlayInputs, f64) {
        let config = &self.config;
        let Some(goal) = config.rebound_goal else {
            return (config.overlay.clone(), config.read_window);
        };

        let rebounds = goal as f64;
        let inputs = OverlayInputs {
            subdivision_count: (goal as usize + 1).max(1),
            target_scalar: rebounds,
            support_scalar: rebounds,
            maintenance_scalar: (2.0 * projection.service_time_seconds).max(0.0),
            ..config.overlay.clone()
        };

        let center_share = 1.0 - config.calibration.edge_share.clamp(0.0, 1.0);
        let read_window = if goal == 0 || center_share <= 0.0 {
            0.0
        } else {
            rebounds * projection.service_time / center_share * (1.0 + REBOUND_READ_MARGIN)
        };

        (inputs, read_window)
    }
}

fn summarize_shape(shape: &Shape, depth: u32, seed: u64) -> ShapeSummary {
    ShapeSummary {
        seed,
        depth,
        total_vertices: shape.vertices.len(),
        segments: shape.edges.len(),
        theoretical_max_vertices: ShapeGenerator::theoretical_max_vertices(depth),
    }
}
