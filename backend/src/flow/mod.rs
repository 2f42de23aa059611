//! Flow simulation - single constant-rate channel with expiring items.
//!
//! All items sit in front of one channel at time 0 and pass through it in
//! FIFO order, one at a time, with a constant service time. Item `i` waits
//! `i × service_time` and finishes one service time later. Each item draws an
//! expiry around the mean; it is kept when the expiry is at least its finish.
//!
//! # Determinism
//!
//! Every pass owns a fresh [`RngManager`] seeded from the parameters, and
//! draws exactly one uniform per item. Two passes that differ only in
//! `expiry_mean` therefore see identical jitter factors, which makes the kept
//! count non-decreasing in the mean expiry.
//!
//! # Example
//!
//! ```
//! use flow_calibration_core_rs::flow::simulate;
//! use flow_calibration_core_rs::models::FlowParameters;
//!
//! let params = FlowParameters {
//!     total_items: 100,
//!     service_rate_coefficient: 0.05,
//!     passage_reduction: 1.0,
//!     expiry_mean: 10.0,
//!     expiry_jitter: 0.2,
//!     sample_max: 10,
//!     rng_seed: 42,
//! };
//! let result = simulate(&params);
//! assert_eq!(result.kept_count + result.lost_count, 100);
//! assert_eq!(result.sample.len(), 10);
//! ```

use crate::models::{FlowParameters, FlowResult, ItemRecord};
use crate::rng::RngManager;

/// Draw a jitter factor in `[1-j, 1+j]`, floored at 0
///
/// `j` is clamped to `[0, 0.99]` again here; callers are not trusted to have
/// done it.
pub fn jitter_factor(jitter: f64, rng: &mut RngManager) -> f64 {
    let j = if jitter.is_nan() {
        0.0
    } else {
        jitter.clamp(0.0, 0.99)
    };
    let u = rng.uniform();
    (1.0 + (2.0 * u - 1.0) * j).max(0.0)
}

/// Run one flow pass
///
/// Aggregates and the bounded sample are produced in the same loop; the
/// sample cap never changes the kept/lost counts.
pub fn simulate(params: &FlowParameters) -> FlowResult {
    let total_items = params.effective_total_items();
    let jitter = params.effective_jitter();
    let service_time = params.service_time();

    let mut rng = RngManager::new(params.rng_seed);
    let mut kept_count = 0usize;
    let mut lost_count = 0usize;
    let mut finish_sum_kept = 0.0f64;
    let mut sample = Vec::with_capacity(total_items.min(params.sample_max));

    for index in 0..total_items {
        let wait = index as f64 * service_time;
        let finish = wait + service_time;
        let expiry = params.expiry_mean * jitter_factor(jitter, &mut rng);

        let kept = expiry >= finish;
        if kept {
            kept_count += 1;
            finish_sum_kept += finish;
        } else {
            lost_count += 1;
        }

        if sample.len() < params.sample_max {
            sample.push(ItemRecord {
                index,
                expiry,
                wait,
                service: service_time,
                finish,
                kept,
            });
        }
    }

    let mean_finish_time_of_kept = if kept_count > 0 {
        finish_sum_kept / kept_count as f64
    } else {
        0.0
    };

    FlowResult {
        total_items,
        kept_count,
        lost_count,
        kept_rate: kept_count as f64 / total_items as f64,
        mean_finish_time_of_kept,
        passage_dimension: params.passage_dimension(),
        throughput: params.throughput(),
        service_time,
        sample,
    }
}

/// Run one flow pass with the mean expiry multiplied by `factor`
pub fn simulate_with_factor(params: &FlowParameters, factor: f64) -> FlowResult {
    simulate(&params.scaled(factor))
}
