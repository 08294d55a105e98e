//! Deterministic per-feature RNG wrapper.
//!
//! # Determinism strategy
//!
//! Every topology feature (site or cluster) owns its own independent
//! `SmallRng`.  The engine hands each feature a seed from a monotonically
//! increasing counter, starting at the caller's global seed, in site-id
//! order.  The counter value is spread across the seed space with the 64-bit
//! fractional golden-ratio constant so consecutive counters do not produce
//! correlated streams.  This means:
//!
//! - Features never share RNG state, so the draw sequence of one feature is
//!   independent of how often any other feature is visited.
//! - Two runs with the same global seed, rates, and hop order replay the
//!   exact same trajectories, including cluster-creation order.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-feature deterministic RNG.
///
/// Create one per site/cluster at registration time; the engine is the only
/// seed source.  The type is `!Sync` to prevent accidental sharing — the
/// walker loop is single-threaded by design.
pub struct FeatureRng(SmallRng);

impl FeatureRng {
    /// Seed deterministically from the engine's monotonic seed counter.
    pub fn new(seed: u64) -> Self {
        FeatureRng(SmallRng::seed_from_u64(seed.wrapping_mul(MIXING_CONSTANT)))
    }

    /// Uniform deviate in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    /// Uniform deviate in `(0, 1]`, safe as a logarithm argument.
    #[inline]
    pub fn uniform_open(&mut self) -> f64 {
        1.0 - self.0.gen::<f64>()
    }

    /// Unit-mean exponential deviate, `-ln(u)` with `u ∈ (0, 1]`.
    ///
    /// Scale by `1/total_rate` (site dwell) or `τ/resolution` (cluster
    /// dwell) at the call site.
    #[inline]
    pub fn exp_deviate(&mut self) -> f64 {
        -self.uniform_open().ln()
    }
}
