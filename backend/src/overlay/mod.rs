//! Structural overlay - bounded integer slot counts from scalar controls.
//!
//! ```text
//! capacity    = subdivision_count - 1
//! target      = clamp(floor(target_scalar),  0, capacity)
//! active      = clamp(floor(support_scalar), 0, target)
//! active      = 1   if maintenance > 0 && target > 0 && active == 0
//! disappeared = target - active
//! ```
//!
//! Each active slot `k` (1-based) also reports its offset `k × offset_step`
//! and a persistence value `maintenance / (1 + support × k)`, which decays
//! with the slot index. Both are reporting only and never feed back into the
//! counts.
//!
//! NaN and negative scalars count as zero. `+∞` saturates like any other
//! large value.

use crate::models::{OverlayInputs, OverlayReport, OverlayResult, SlotPersistence};

/// NaN and negative scalars count as zero
fn non_negative(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.max(0.0)
    }
}

/// Floor of a non-negative scalar; `as` saturates at `usize::MAX`
fn floor_count(value: f64) -> usize {
    non_negative(value).floor() as usize
}

/// Offset of slot `k`; a non-finite step places every slot at 0
pub fn slot_offset(offset_step: f64, slot: usize) -> f64 {
    if offset_step.is_finite() {
        offset_step * slot as f64
    } else {
        0.0
    }
}

/// Compute the slot counts
///
/// # Example
/// ```
/// use flow_calibration_core_rs::models::OverlayInputs;
/// use flow_calibration_core_rs::overlay::compute_overlay;
///
/// let result = compute_overlay(&OverlayInputs {
///     subdivision_count: 5,
///     target_scalar: 3.0,
///     support_scalar: 0.0,
///     maintenance_scalar: 5.0,
///     ..OverlayInputs::default()
/// });
/// assert_eq!((result.capacity, result.target, result.active, result.disappeared), (4, 3, 1, 2));
/// ```
pub fn compute_overlay(inputs: &OverlayInputs) -> OverlayResult {
    let capacity = inputs.subdivision_count.max(1) - 1;
    let target = floor_count(inputs.target_scalar).min(capacity);
    let mut active = floor_count(inputs.support_scalar).min(target);

    if non_negative(inputs.maintenance_scalar) > 0.0 && target > 0 && active == 0 {
        active = 1;
    }

    OverlayResult {
        capacity,
        target,
        active,
        disappeared: target - active,
    }
}

/// Persistence of slot `k`: `max(0, maintenance / (1 + support × k))`
///
/// Infinite maintenance over infinite support is undefined and reports 0.
pub fn slot_persistence(maintenance_scalar: f64, support_scalar: f64, slot: usize) -> f64 {
    let attenuation = 1.0 / (1.0 + non_negative(support_scalar) * slot as f64);
    let persistence = non_negative(maintenance_scalar) * attenuation;
    if persistence.is_nan() {
        0.0
    } else {
        persistence.max(0.0)
    }
}

/// Slot counts plus the offset and persistence of every active slot
///
/// One entry is allocated per active slot, so callers bound
/// `subdivision_count` before reporting on untrusted input.
pub fn overlay_report(inputs: &OverlayInputs) -> OverlayReport {
    let result = compute_overlay(inputs);
    let slots = (1..=result.active)
        .map(|slot| SlotPersistence {
            slot,
            offset: slot_offset(inputs.offset_step, slot),
            persistence: slot_persistence(inputs.maintenance_scalar, inputs.support_scalar, slot),
        })
        .collect();

    OverlayReport {
        result,
        offset_step: inputs.offset_step,
        recover_tag: inputs.recover_tag,
        slots,
    }
}
