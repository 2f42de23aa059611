//! Orchestrator - runs the full pipeline around the calibration core
//!
//! See `engine.rs` for the stage order.

pub mod config;
pub mod engine;
pub mod fingerprint;

// Re-export main types for convenience
pub use config::{FlowSettings, InputLimits, PipelineConfig};
pub use engine::{
    Pipeline, PipelineError, PipelineReport, Projection, ReadableWindow, ReplicaRatio,
    RetentionTargets, ShapeSummary, TimelineSummary,
};
pub use fingerprint::compute_config_hash;
