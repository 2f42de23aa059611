//! Structural overlay inputs and outputs

use serde::{Deserialize, Serialize};

/// Scalar controls of the structural overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayInputs {
    /// Number of subdivisions (≥1); capacity is one less
    pub subdivision_count: usize,

    /// Spacing between consecutive slots; may be negative, zero or positive
    pub offset_step: f64,

    /// Requested number of target slots (floored)
    pub target_scalar: f64,

    /// Requested number of active slots (floored), also the persistence decay rate
    pub support_scalar: f64,

    /// Maintenance budget; any positive value keeps at least one slot alive
    pub maintenance_scalar: f64,

    /// Free-form recovery tag, echoed in the report and never interpreted
    pub recover_tag: f64,
}

impl Default for OverlayInputs {
    fn default() -> Self {
        Self {
            subdivision_count: 3,
            offset_step: 0.15,
            target_scalar: 0.0,
            support_scalar: 1.0,
            maintenance_scalar: 0.0,
            recover_tag: 0.0,
        }
    }
}

/// Bounded slot counts
///
/// Invariant: `0 <= active <= target <= capacity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayResult {
    pub capacity: usize,
    pub target: usize,
    pub active: usize,
    pub disappeared: usize,
}

/// Position and persistence of one active slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotPersistence {
    /// Slot index, 1-based
    pub slot: usize,
    /// `slot × offset_step`
    pub offset: f64,
    pub persistence: f64,
}

/// Overlay counts plus per-slot details (reporting only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayReport {
    pub result: OverlayResult,
    pub offset_step: f64,
    pub recover_tag: f64,
    pub slots: Vec<SlotPersistence>,
}
