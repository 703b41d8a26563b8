//! Fixed-capacity rolling latency history

use std::collections::VecDeque;

/// Rolling window of latency samples in milliseconds
///
/// Holds at most `capacity` samples in arrival order; the oldest sample is
/// evicted first. Average and maximum are recomputed on every push so they
/// are always consistent with the window.
#[derive(Debug, Clone)]
pub struct LatencyHistory {
    samples: VecDeque<f64>,
    capacity: usize,
    avg: Option<f64>,
    max: Option<f64>,
}

impl LatencyHistory {
    /// Create an empty history holding up to `capacity` samples
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            avg: None,
            max: None,
        }
    }

    /// Append a sample, evicting the oldest beyond capacity
    pub fn push(&mut self, latency_ms: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(latency_ms);

        let sum: f64 = self.samples.iter().sum();
        self.avg = Some(sum / self.samples.len() as f64);
        self.max = self.samples.iter().copied().reduce(f64::max);
    }

    /// Rolling average, `None` before the first sample
    pub fn average(&self) -> Option<f64> {
        self.avg
    }

    /// Rolling maximum, `None` before the first sample
    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Most recent sample
    pub fn last(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }
}
