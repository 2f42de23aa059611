//! Metrics derived from a calibration pass

use crate::flow::simulate_with_factor;
use crate::models::FlowParameters;

/// Flow duration at the edges is this fraction of the center duration
pub const EDGE_DISCOUNT: f64 = 0.75;

/// Kept count of a run at `factor`
pub fn projected_capacity(base: &FlowParameters, factor: f64) -> usize {
    simulate_with_factor(base, factor).kept_count
}

/// Center/edge weighted flow duration
///
/// ```text
/// base_life   = (expiry_mean + mean_finish) / 2   if mean_finish > 0
///             = expiry_mean                       otherwise
/// center_life = base_life × factor
/// edge_life   = center_life × 0.75
/// metric      = center_life × (1 - s) + edge_life × s,   s = clamp(edge_share, 0, 1)
/// ```
pub fn flow_duration_metric(
    expiry_mean: f64,
    mean_finish_time_of_kept: f64,
    factor: f64,
    edge_share: f64,
) -> f64 {
    let base_life = if mean_finish_time_of_kept > 0.0 {
        0.5 * (expiry_mean + mean_finish_time_of_kept)
    } else {
        expiry_mean
    };
    let center_life = base_life * factor;
    let edge_life = center_life * EDGE_DISCOUNT;
    let share = if edge_share.is_nan() {
        0.0
    } else {
        edge_share.clamp(0.0, 1.0)
    };
    center_life * (1.0 - share) + edge_life * share
}
