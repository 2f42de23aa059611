//! Flow Calibration Core - Rust Engine
//!
//! Deterministic flow simulation with a calibration search on top.
//!
//! # Architecture
//!
//! - **rng**: Deterministic random number generation
//! - **models**: Parameter, result and event types
//! - **flow**: Single-channel flow simulation with expiring items
//! - **calibration**: Scale-factor search and derived metrics
//! - **overlay**: Bounded structural slot counts
//! - **shape**: Hierarchical polygon generator (vertex count and depth)
//! - **timeline**: Timestamped event generator (effective replica count)
//! - **orchestrator**: Configuration and the end-to-end pipeline
//!
//! # Critical Invariants
//!
//! 1. All randomness is deterministic (seeded RNG, one fresh RNG per flow run)
//! 2. Kept + lost always equals the number of items
//! 3. The kept count never decreases as the expiry scale factor grows
//! 4. Overlay counts satisfy 0 <= active <= target <= capacity

// Module declarations
pub mod calibration;
pub mod flow;
pub mod models;
pub mod orchestrator;
pub mod overlay;
pub mod rng;
pub mod shape;
pub mod timeline;

// Re-exports for convenience
pub use calibration::{calibrate, find_min_factor, CalibrationConfig};
pub use flow::{simulate, simulate_with_factor};
pub use models::{
    CalibrationEvent, CalibrationResult, CalibrationTarget, EventLog, FlowParameters, FlowResult,
    ItemRecord, OverlayInputs, OverlayReport, OverlayResult, SearchBracket, SearchKind,
    SearchOutcome,
};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineError, PipelineReport};
pub use overlay::{compute_overlay, overlay_report};
pub use rng::RngManager;

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn flow_calibration_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::run_pipeline, m)?)?;
    Ok(())
}
