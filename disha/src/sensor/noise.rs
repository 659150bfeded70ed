//! Seeded noise generator for simulated sensing and motion.
//!
//! Provides Gaussian and uniform samples with deterministic seeding.
//! Independent streams (one per reference-table cell, for instance) are
//! derived from a base seed so results do not depend on scheduling.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand::seq::index;
use rand_distr::{Distribution, StandardNormal, Uniform};

/// Noise generator with configurable seed for reproducibility
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    rng: SmallRng,
}

impl NoiseGenerator {
    /// Create a new noise generator
    ///
    /// If seed is 0, uses random entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Deterministic stream `stream` derived from `seed` (always seeded,
    /// even when `seed` is 0).
    pub fn for_stream(seed: u64, stream: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(splitmix64(seed ^ splitmix64(stream))),
        }
    }

    /// Stream `stream` of `seed`, or entropy when `seed` is 0.
    pub fn derive(seed: u64, stream: u64) -> Self {
        if seed == 0 {
            Self::new(0)
        } else {
            Self::for_stream(seed, stream)
        }
    }

    /// Generate Gaussian noise with given standard deviation
    #[inline]
    pub fn gaussian(&mut self, stddev: f64) -> f64 {
        if stddev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Generate uniform random in [0, 1)
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        Uniform::new(0.0f64, 1.0).sample(&mut self.rng)
    }

    /// Uniform sample in `[lo, hi)`; returns `lo` for an empty range
    #[inline]
    pub fn uniform_range(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + (hi - lo) * self.uniform()
    }

    /// Uniform integer in `[0, n)`; `n` must be non-zero
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// `amount` distinct indices from `[0, n)`
    pub fn distinct_indices(&mut self, n: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, n, amount.min(n)).into_vec()
    }
}

/// SplitMix64 finalizer, spreads nearby seeds apart
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
