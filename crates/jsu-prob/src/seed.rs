//! Reproducible seed derivation.
//!
//! A [`SeedStream`] turns one user seed into a sequence of independent
//! sub-seeds, salted per consumer so two distributions sampled with the same
//! user seed do not draw identical noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

/// Deterministic stream of `u64` seeds derived from `(seed, salt, counter)`.
#[derive(Debug, Clone)]
pub struct SeedStream {
    base: u64,
    salt: String,
    counter: u64,
}

impl SeedStream {
    /// New stream. `None` draws the base seed from the thread-local RNG.
    pub fn new(seed: Option<u64>, salt: impl Into<String>) -> Self {
        let base = seed.unwrap_or_else(|| rand::rng().random());
        Self { base, salt: salt.into(), counter: 0 }
    }

    /// Base seed the stream was built from.
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Next sub-seed.
    pub fn next_seed(&mut self) -> u64 {
        self.counter += 1;
        let mut h = Sha256::new();
        h.update(self.base.to_le_bytes());
        h.update(self.salt.as_bytes());
        h.update(self.counter.to_le_bytes());
        let digest = h.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    /// RNG seeded with the next sub-seed.
    pub fn next_rng(&mut self) -> StdRng {
        StdRng::seed_from_u64(self.next_seed())
    }
}
