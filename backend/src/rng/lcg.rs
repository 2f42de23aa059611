//! 64-bit linear congruential generator
//!
//! # Algorithm
//!
//! ```text
//! state' = 2862933555777941757 * state + 3037000493   (mod 2^64)
//! output = state' >> 32
//! ```
//!
//! `uniform()` maps the 32-bit output to `(x + 0.5) / 2^32`, which lies in the
//! open interval (0, 1): neither 0 nor 1 can ever be produced.
//!
//! # Determinism
//!
//! Same seed → same sequence. The calibration search depends on this: it
//! re-runs the flow simulation with a different scale factor but the same seed,
//! so every item sees the same jitter draw and kept counts move monotonically.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const MULTIPLIER: u64 = 2_862_933_555_777_941_757;
const INCREMENT: u64 = 3_037_000_493;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Deterministic random number generator (64-bit LCG)
///
/// # Example
/// ```
/// use flow_calibration_core_rs::RngManager;
///
/// let mut rng = RngManager::new(42);
/// let u = rng.uniform();
/// assert!(u > 0.0 && u < 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// Any seed is valid, including zero.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Advance the state and return its high 32 bits
    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT);
        (self.state >> 32) as u32
    }

    /// Combine two draws into a 64-bit value
    ///
    /// Used to derive independent stage seeds from one master seed.
    pub fn next_u64(&mut self) -> u64 {
        let hi = self.next_u32() as u64;
        let lo = self.next_u32() as u64;
        (hi << 32) | lo
    }

    /// Generate a uniform f64 in the open interval (0.0, 1.0)
    ///
    /// # Example
    /// ```
    /// use flow_calibration_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// let p = rng.uniform();
    /// assert!(p > 0.0 && p < 1.0);
    /// ```
    pub fn uniform(&mut self) -> f64 {
        (self.next_u32() as f64 + 0.5) / TWO_POW_32
    }

    /// Generate an integer in `[lo, hi]` (inclusive)
    ///
    /// Returns `lo` when the range is empty (`hi <= lo`).
    pub fn uniform_int(&mut self, lo: i64, hi: i64) -> i64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        let offset = (self.uniform() * span).floor() as i64;
        // uniform() < 1 keeps offset <= hi - lo, the min() guards rounding at the top
        lo + offset.min(hi - lo)
    }

    /// Uniform angle in radians, `[0, 2π)`
    pub fn angle(&mut self) -> f64 {
        self.uniform() * 2.0 * PI
    }

    /// Get current RNG state (for inspection/replay)
    ///
    /// ```
    /// use flow_calibration_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(7);
    /// rng.next_u32();
    /// let mut replay = RngManager::new(rng.get_state());
    /// assert_eq!(rng.next_u32(), replay.next_u32());
    /// ```
    pub fn get_state(&self) -> u64 {
        self.state
    }
}
