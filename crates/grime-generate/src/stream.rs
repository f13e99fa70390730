//! The single deterministic randomness source of a generation run.
//!
//! Every draw a dataset makes (corruption decisions, catalog picks, numeric
//! noise and the faker's own draws) comes out of one [`RandomStream`], in a
//! fixed per-record order. Datasets never share a stream: each one is seeded
//! from the run seed through [`derive_seed`], which is the partition scheme
//! any parallel generator must also follow.

use std::fmt;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RandomStream {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Independent sub-stream for `label` under the run seed.
    pub fn derived(seed: u64, label: &str) -> Self {
        Self::seeded(derive_seed(seed, label))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }

    /// Uniform element of a non-empty slice.
    pub fn pick<'a, T>(&mut self, values: &'a [T]) -> &'a T {
        let idx = self.index(values.len());
        &values[idx]
    }

    pub fn int_inclusive(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// `low + (high - low) * unit()`; consumes exactly one draw.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.unit()
    }
}

impl fmt::Debug for RandomStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomStream")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl RngCore for RandomStream {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.rng.fill_bytes(dst)
    }
}

/// FNV-1a mix of the run seed and a stream label.
pub fn derive_seed(seed: u64, label: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in label.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}
