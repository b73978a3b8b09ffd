use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DEFAULT_SEED: u64 = 3819201;

/// Source of randomness for expansion, playouts and the legality fallback.
///
/// Injected into the search so that tests can pin every random choice to a seed.
pub trait RandomGenerator {
    /// Returns a uniformly distributed index in `0..len`. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize;

    /// Picks a uniformly random element, `None` for an empty slice.
    fn pick<'a, K>(&mut self, items: &'a [K]) -> Option<&'a K> {
        if items.is_empty() {
            None
        } else {
            items.get(self.next_index(items.len()))
        }
    }
}

impl<R: RandomGenerator + ?Sized> RandomGenerator for &mut R {
    fn next_index(&mut self, len: usize) -> usize {
        (**self).next_index(len)
    }
}

/// [`RandomGenerator`] backed by rand's `StdRng`.
#[derive(Debug, Clone)]
pub struct StandardRandomGenerator {
    rng: StdRng,
}

impl Default for StandardRandomGenerator {
    fn default() -> Self {
        StandardRandomGenerator::seeded(DEFAULT_SEED)
    }
}

impl StandardRandomGenerator {
    /// A generator that replays the same sequence for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomGenerator for StandardRandomGenerator {
    fn next_index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}
