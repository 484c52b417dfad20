//! Latency sample storage.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Arithmetic mean of a set of latency samples.
///
/// Returns `Duration::ZERO` for an empty set.
pub fn mean(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        return Duration::ZERO;
    }

    let total_nanos: u128 = samples.iter().map(|d| d.as_nanos()).sum();
    let mean_nanos = total_nanos / samples.len() as u128;
    Duration::from_nanos(u64::try_from(mean_nanos).unwrap_or(u64::MAX))
}

/// Ordered sequence of latency samples for one operation class.
///
/// Unbounded by default. With a capacity the sequence becomes a uniform
/// reservoir (Algorithm R): the first `capacity` samples are kept as-is and
/// every later sample replaces a random slot with probability
/// `capacity / seen`.
#[derive(Debug)]
pub struct LatencySamples {
    samples: Vec<Duration>,
    /// Total number of samples offered, including those not retained
    seen: u64,
    capacity: Option<usize>,
    rng: StdRng,
}

impl LatencySamples {
    /// Create an unbounded sample sequence.
    pub fn unbounded() -> Self {
        Self {
            samples: Vec::new(),
            seen: 0,
            capacity: None,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// Create a reservoir holding at most `capacity` samples.
    pub fn reservoir(capacity: usize, seed: u64) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            seen: 0,
            capacity: Some(capacity),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Record a sample.
    pub fn push(&mut self, latency: Duration) {
        self.seen += 1;

        match self.capacity {
            Some(capacity) if self.samples.len() >= capacity => {
                let slot = self.rng.random_range(0..self.seen);
                if let Ok(slot) = usize::try_from(slot) {
                    if slot < capacity {
                        self.samples[slot] = latency;
                    }
                }
            }
            _ => self.samples.push(latency),
        }
    }

    /// Retained samples, in insertion order while unbounded.
    pub fn samples(&self) -> &[Duration] {
        &self.samples
    }

    /// Number of samples offered so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean of the retained samples.
    pub fn mean(&self) -> Duration {
        mean(&self.samples)
    }
}

impl Default for LatencySamples {
    fn default() -> Self {
        Self::unbounded()
    }
}
