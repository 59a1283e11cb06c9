//! Bernoulli and uniform-integer samplers over a seeded generator.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A biased coin and fair die over one owned generator.
///
/// All sampling in a run shares one `Coin`, so a fixed seed reproduces the
/// whole search trajectory.
#[derive(Debug, Clone)]
pub struct Coin {
    rng: ChaCha8Rng,
}

impl Coin {
    /// A `Coin` with a caller-chosen seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// A `Coin` seeded from the wall clock.
    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::seeded(nanos)
    }

    /// A uniform draw from `[0, 1)`.
    pub fn uniform(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Returns `true` with probability `bias`.
    pub fn flip(&mut self, bias: f64) -> bool {
        self.uniform() < bias
    }

    /// A fair flip.
    pub fn fair(&mut self) -> bool {
        self.flip(0.5)
    }

    /// A fair roll of an `m`-sided die, in `[0, m)`.
    ///
    /// Floor-scales a `[0, 1)` uniform; the trailing modulus guards the
    /// (unreachable in practice) case of the product rounding up to `m`.
    pub fn roll(&mut self, m: usize) -> usize {
        ((self.uniform() * m as f64).floor() as usize) % m
    }

    /// The sum of `dice` fair rolls of an `m`-sided die.
    pub fn roll_sum(&mut self, dice: usize, m: usize) -> usize {
        (0..dice).map(|_| self.roll(m)).sum()
    }
}
