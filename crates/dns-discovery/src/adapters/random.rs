//! Random Source Adapters

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;

use crate::ports::RandomSource;

/// Production random source backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomSource;

impl ThreadRandomSource {
    /// Create a new thread RNG source.
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for ThreadRandomSource {
    fn random_usize(&self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(0..max)
    }
}

/// Fixed random source for deterministic testing.
///
/// Replays a sequence of values, cycling when it runs out. Each value is
/// reduced modulo the requested bound.
///
/// # Example
///
/// ```rust
/// use dns_discovery::adapters::FixedRandomSource;
/// use dns_discovery::ports::RandomSource;
///
/// let rng = FixedRandomSource::new(42);
/// assert_eq!(rng.random_usize(100), 42);
/// assert_eq!(rng.random_usize(100), 42); // Always same value
///
/// let rng = FixedRandomSource::sequence(vec![0, 1]);
/// assert_eq!(rng.random_usize(10), 0);
/// assert_eq!(rng.random_usize(10), 1);
/// assert_eq!(rng.random_usize(10), 0);
/// ```
#[derive(Debug)]
pub struct FixedRandomSource {
    values: Vec<usize>,
    cursor: AtomicUsize,
}

impl FixedRandomSource {
    /// Create a fixed random source that always returns the given value.
    pub fn new(value: usize) -> Self {
        Self::sequence(vec![value])
    }

    /// Create a random source that returns 0 (first element).
    pub fn first() -> Self {
        Self::new(0)
    }

    /// Replay `values` in order, then start over.
    pub fn sequence(values: Vec<usize>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for FixedRandomSource {
    fn random_usize(&self, max: usize) -> usize {
        if max == 0 || self.values.is_empty() {
            return 0;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[i] % max
    }
}
