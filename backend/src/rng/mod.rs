//! Deterministic random number generation
//!
//! Uses a 64-bit linear congruential generator with a high-word output.
//! CRITICAL: All randomness in the engine MUST go through this module, so that
//! re-running a simulation with the same seed replays the same draws.

mod lcg;

pub use lcg::RngManager;
