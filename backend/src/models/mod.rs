//! Domain models for the flow calibration engine

pub mod calibration;
pub mod event;
pub mod flow;
pub mod overlay;

// Re-exports
pub use calibration::{CalibrationResult, CalibrationTarget, SearchBracket, SearchOutcome};
pub use event::{CalibrationEvent, EventLog, SearchKind, SearchPhase};
pub use flow::{passage_reduction_for_depth, FlowParameters, FlowResult, ItemRecord};
pub use overlay::{OverlayInputs, OverlayReport, OverlayResult, SlotPersistence};
