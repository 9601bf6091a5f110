//! Bounded per-order sample history.
//!
//! A fixed-capacity ring: O(1) append, oldest sample evicted first, and
//! O(window) access to the most recent samples.

use crate::ingest::sample::MetricSample;
use std::collections::VecDeque;

/// Ring buffer of the last `capacity` samples of one order.
#[derive(Clone, Debug)]
pub struct MetricHistory {
    samples: VecDeque<MetricSample>,
    capacity: usize,
    evicted: u64,
}

impl MetricHistory {
    /// Create an empty history. A zero capacity is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: MetricSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
            self.evicted += 1;
        }
        self.samples.push_back(sample);
    }

    /// The most recent `n` samples, oldest first.
    pub fn tail(&self, n: usize) -> Vec<MetricSample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).cloned().collect()
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no sample has been retained.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples dropped so far.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }
}
