//! Pipeline configuration, limits and sanitization
//!
//! Configuration arrives as JSON. Every field is optional and falls back to
//! its default; out-of-range values are clamped by [`PipelineConfig::sanitize`]
//! rather than rejected. Only structurally unusable settings (a search bracket
//! that cannot be searched, an impossible polygon side range) fail
//! [`PipelineConfig::validate`].

use crate::calibration::CalibrationConfig;
use crate::models::{CalibrationTarget, OverlayInputs};
use crate::orchestrator::PipelineError;
use crate::rng::RngManager;
use crate::shape::{ShapeParams, MAX_SIDES};
use crate::timeline::TimelineParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Configuration Types
// ============================================================================

/// Flow settings not derived from the shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    pub service_rate_coefficient: f64,
    pub expiry_mean: f64,
    pub expiry_jitter: f64,
    pub sample_max: usize,
    pub seed: u64,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            service_rate_coefficient: 0.05,
            expiry_mean: 10.0,
            expiry_jitter: 0.20,
            sample_max: 10,
            seed: 0x1BAD_B002,
        }
    }
}

/// Complete pipeline configuration
///
/// # Example
/// ```
/// use flow_calibration_core_rs::orchestrator::PipelineConfig;
///
/// let config = PipelineConfig::from_json_str(r#"{ "retention_factor": 99 }"#).unwrap();
/// assert_eq!(config.sanitize().retention_factor, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub shape: ShapeParams,
    pub timeline: TimelineParams,
    pub flow: FlowSettings,
    pub calibration: CalibrationConfig,

    /// Divisor turning the baseline lost count into a lost target
    pub retention_factor: u32,

    /// Explicit calibration target; derived from `retention_factor` when absent
    pub target: Option<CalibrationTarget>,

    /// Read window, in ticks, used for the readable projection
    pub read_window: f64,

    pub overlay: OverlayInputs,

    /// Desired number of rebounds; when set it drives the overlay and the read window
    pub rebound_goal: Option<u32>,

    /// Seconds per tick, for the maintenance budget derived from a rebound goal
    pub tick_seconds: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shape: ShapeParams::default(),
            timeline: TimelineParams::default(),
            flow: FlowSettings::default(),
            calibration: CalibrationConfig::default(),
            retention_factor: 4,
            target: None,
            read_window: 10.0,
            overlay: OverlayInputs::default(),
            rebound_goal: None,
            tick_seconds: 0.01,
        }
    }
}

// ============================================================================
// Limits
// ============================================================================

/// Bounds applied by [`PipelineConfig::sanitize`]
#[derive(Debug, Clone, PartialEq)]
pub struct InputLimits {
    pub min_retention: u32,
    pub max_retention: u32,
    pub min_read: f64,
    pub max_read: f64,
    pub min_subdivision: usize,
    pub max_subdivision: usize,
    pub min_offset: f64,
    pub max_offset: f64,
    pub max_support: f64,
    pub max_target: f64,
    pub max_maintenance: f64,
    pub min_recover: f64,
    pub max_recover: f64,
    pub max_jitter: f64,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            min_retention: 1,
            max_retention: 32,
            min_read: 0.1,
            max_read: 300.0,
            min_subdivision: 1,
            max_subdivision: 64,
            min_offset: -1000.0,
            max_offset: 1000.0,
            max_support: 100.0,
            max_target: 1000.0,
            max_maintenance: 1e6,
            min_recover: -1e12,
            max_recover: 1e12,
            max_jitter: 0.99,
        }
    }
}

/// NaN and values below `lo` become `lo`
fn clamp_or(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Like [`clamp_or`] for signed ranges: NaN becomes 0
fn clamp_nan_zero(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(lo, hi)
    }
}

impl PipelineConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json)
            .map_err(|e| PipelineError::Serialization(format!("Config parse failed: {}", e)))
    }

    /// Read and parse a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Derive the shape, timeline and flow seeds from one master seed
    pub fn with_master_seed(mut self, seed: u64) -> Self {
        let mut rng = RngManager::new(seed);
        self.shape.seed = rng.next_u64();
        self.timeline.seed = rng.next_u64();
        self.flow.seed = rng.next_u64();
        self
    }

    /// Clamp every scalar into its documented range
    pub fn sanitize(self) -> Self {
        self.sanitize_with(&InputLimits::default())
    }

    pub fn sanitize_with(mut self, lim: &InputLimits) -> Self {
        self.retention_factor = self
            .retention_factor
            .clamp(lim.min_retention, lim.max_retention);

        if !(self.read_window > 0.0) {
            self.read_window = lim.min_read;
        }
        self.read_window = clamp_or(self.read_window, lim.min_read, lim.max_read);

        self.flow.expiry_jitter = clamp_or(self.flow.expiry_jitter, 0.0, lim.max_jitter);
        self.calibration.edge_share = clamp_or(self.calibration.edge_share, 0.0, 1.0);

        self.overlay.subdivision_count = self
            .overlay
            .subdivision_count
            .clamp(lim.min_subdivision, lim.max_subdivision);
        self.overlay.support_scalar = clamp_or(self.overlay.support_scalar, 0.0, lim.max_support);
        self.overlay.target_scalar = clamp_or(self.overlay.target_scalar, 0.0, lim.max_target);
        self.overlay.maintenance_scalar =
            clamp_or(self.overlay.maintenance_scalar, 0.0, lim.max_maintenance);
        self.overlay.offset_step =
            clamp_nan_zero(self.overlay.offset_step, lim.min_offset, lim.max_offset);
        self.overlay.recover_tag =
            clamp_nan_zero(self.overlay.recover_tag, lim.min_recover, lim.max_recover);

        // a goal of R rebounds needs R + 1 subdivisions
        let max_rebounds = lim.max_subdivision.saturating_sub(1).min(u32::MAX as usize) as u32;
        self.rebound_goal = self.rebound_goal.map(|goal| goal.min(max_rebounds));

        self.tick_seconds = clamp_or(self.tick_seconds, 0.0, f64::MAX);
        self
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.calibration
            .bracket
            .validate()
            .map_err(PipelineError::InvalidConfig)?;

        if self.shape.min_sides < 3 {
            return Err(PipelineError::InvalidConfig(format!(
                "shape min_sides must be at least 3, got {}",
                self.shape.min_sides
            )));
        }
        if self.shape.max_sides > MAX_SIDES {
            return Err(PipelineError::InvalidConfig(format!(
                "shape max_sides must be at most {}, got {}",
                MAX_SIDES, self.shape.max_sides
            )));
        }
        if self.shape.max_sides < self.shape.min_sides {
            return Err(PipelineError::InvalidConfig(format!(
                "shape max_sides ({}) below min_sides ({})",
                self.shape.max_sides, self.shape.min_sides
            )));
        }
        if !(self.shape.base_size.is_finite() && self.shape.base_size > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "shape base_size must be positive, got {}",
                self.shape.base_size
            )));
        }
        if !(self.flow.expiry_mean.is_finite() && self.flow.expiry_mean > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "flow expiry_mean must be positive, got {}",
                self.flow.expiry_mean
            )));
        }
        if !self.flow.service_rate_coefficient.is_finite() {
            return Err(PipelineError::InvalidConfig(
                "flow service_rate_coefficient must be finite".to_string(),
            ));
        }

        Ok(())
    }
}
