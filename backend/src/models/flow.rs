//! Flow simulation parameters and results
//!
//! A flow run pushes `total_items` items through a single constant-rate
//! channel. Each item carries an expiry drawn around `expiry_mean`; it is
//! *kept* when its expiry is at least its finish time, *lost* otherwise.

use serde::{Deserialize, Serialize};

/// Floor applied to the channel throughput (and to a scaled mean expiry).
///
/// Keeps `service_time` finite when the rate coefficient or the passage
/// reduction is zero.
pub const FLOW_EPSILON: f64 = 1e-9;

/// Hard cap applied to the expiry jitter amplitude
pub const MAX_EXPIRY_JITTER: f64 = 0.99;

/// Valid recursion depths for the shape that feeds a flow run
pub const MIN_DEPTH: u32 = 1;
pub const MAX_DEPTH: u32 = 4;

/// Per-depth reduction of the passage dimension
const PASSAGE_REDUCTION_PER_DEPTH: f64 = 0.25;

/// Inputs to a single flow simulation pass
///
/// # Example
/// ```
/// use flow_calibration_core_rs::models::FlowParameters;
///
/// let params = FlowParameters {
///     total_items: 100,
///     service_rate_coefficient: 0.05,
///     passage_reduction: 1.0,
///     ..FlowParameters::default()
/// };
/// assert!((params.service_time() - 0.2).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowParameters {
    /// Number of items pushed through the channel (floored to 1)
    pub total_items: usize,

    /// Items per unit of passage dimension per unit of time
    pub service_rate_coefficient: f64,

    /// Passage reduction in (0, 1], `0.25^r` for a depth-`r` shape
    pub passage_reduction: f64,

    /// Mean expiry drawn for each item
    pub expiry_mean: f64,

    /// Relative jitter amplitude: expiry ∈ mean × [1-j, 1+j]
    pub expiry_jitter: f64,

    /// Number of leading items kept as detailed records
    pub sample_max: usize,

    /// Seed of the per-run RNG
    pub rng_seed: u64,
}

impl Default for FlowParameters {
    fn default() -> Self {
        Self {
            total_items: 1,
            service_rate_coefficient: 0.05,
            passage_reduction: PASSAGE_REDUCTION_PER_DEPTH,
            expiry_mean: 10.0,
            expiry_jitter: 0.20,
            sample_max: 64,
            rng_seed: 0x1BAD_B002,
        }
    }
}

impl FlowParameters {
    /// Parameters for a shape with `total_items` vertices and depth `depth`
    ///
    /// The depth is clamped to `[1, 4]` before deriving the passage reduction.
    pub fn for_shape(total_items: usize, depth: u32) -> Self {
        Self {
            total_items: total_items.max(1),
            passage_reduction: passage_reduction_for_depth(depth),
            ..Self::default()
        }
    }

    /// Item count actually simulated
    pub fn effective_total_items(&self) -> usize {
        self.total_items.max(1)
    }

    /// Jitter amplitude actually applied, clamped to `[0, 0.99]`
    pub fn effective_jitter(&self) -> f64 {
        if self.expiry_jitter.is_nan() {
            return 0.0;
        }
        self.expiry_jitter.clamp(0.0, MAX_EXPIRY_JITTER)
    }

    /// `total_items × passage_reduction`
    pub fn passage_dimension(&self) -> f64 {
        self.effective_total_items() as f64 * self.passage_reduction
    }

    /// Items served per unit of time, floored at [`FLOW_EPSILON`]
    pub fn throughput(&self) -> f64 {
        let raw = self.service_rate_coefficient * self.passage_dimension();
        if raw.is_nan() {
            return FLOW_EPSILON;
        }
        raw.max(FLOW_EPSILON)
    }

    /// Constant per-item service time (always finite and positive)
    pub fn service_time(&self) -> f64 {
        1.0 / self.throughput()
    }

    /// Copy of these parameters with the mean expiry multiplied by `factor`
    ///
    /// Everything else, the seed included, is left unchanged.
    pub fn scaled(&self, factor: f64) -> Self {
        let expiry_mean = (self.expiry_mean * factor).max(FLOW_EPSILON);
        Self {
            expiry_mean,
            ..self.clone()
        }
    }
}

/// `0.25^r` with `r` clamped to `[1, 4]`
pub fn passage_reduction_for_depth(depth: u32) -> f64 {
    let r = depth.clamp(MIN_DEPTH, MAX_DEPTH);
    PASSAGE_REDUCTION_PER_DEPTH.powi(r as i32)
}

/// Detailed record of one item (sample only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub index: usize,
    pub expiry: f64,
    pub wait: f64,
    pub service: f64,
    pub finish: f64,
    pub kept: bool,
}

/// Aggregate outcome of one flow pass
///
/// Invariant: `kept_count + lost_count == total_items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowResult {
    pub total_items: usize,
    pub kept_count: usize,
    pub lost_count: usize,

    /// `kept_count / total_items`
    pub kept_rate: f64,

    /// Mean finish time over kept items (0 when none were kept)
    pub mean_finish_time_of_kept: f64,

    pub passage_dimension: f64,
    pub throughput: f64,
    pub service_time: f64,

    /// First `sample_max` items in generation order
    pub sample: Vec<ItemRecord>,
}

impl FlowResult {
    /// Kept items as a percentage of all items
    pub fn kept_percentage(&self) -> f64 {
        let total = (self.kept_count + self.lost_count).max(1);
        100.0 * self.kept_count as f64 / total as f64
    }
}
