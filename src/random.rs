//! Random jitter sources for particle spawning.
//!
//! Emission jitter is drawn through the [`RandomSource`] trait so the
//! spawner never touches a global generator: the default
//! [`EntropyRandom`] is seeded once at construction, and tests substitute
//! a [`SequenceRandom`] to make spawning fully deterministic.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// A uniform random scalar source.
///
/// `sample(min, max)` draws from a uniform continuous distribution over
/// `[min, max]`. Callers must keep `min <= max`.
pub trait RandomSource {
    /// Draw a uniformly distributed value in `[min, max]`.
    fn sample(&mut self, min: f32, max: f32) -> f32;
}

/// Default random source backed by a fast non-cryptographic generator.
///
/// Seeded from OS entropy exactly once, when constructed — never
/// re-seeded per call.
pub struct EntropyRandom {
    rng: SmallRng,
}

impl EntropyRandom {
    /// Create a source seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create a source with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for EntropyRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for EntropyRandom {
    fn sample(&mut self, min: f32, max: f32) -> f32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }
}

/// Replays a fixed sequence of unit values, for deterministic tests.
///
/// Each stored value is interpreted as a position in `[0, 1]` and mapped
/// into the requested `[min, max]` range; the sequence wraps around when
/// exhausted. An empty sequence always yields `min`.
pub struct SequenceRandom {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceRandom {
    /// Create a source replaying `values` (each in `[0, 1]`).
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    /// A source that always returns the midpoint of the requested range.
    ///
    /// With midpoint jitter, `jitter * sample(-1, 1)` is exactly zero,
    /// which turns every spawn parameter into its base value.
    pub fn midpoint() -> Self {
        Self::new(vec![0.5])
    }
}

impl RandomSource for SequenceRandom {
    fn sample(&mut self, min: f32, max: f32) -> f32 {
        if self.values.is_empty() {
            return min;
        }
        let t = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        min + (max - min) * t
    }
}
