//! Bounded sample history for the live chart

use std::collections::VecDeque;

/// Default number of samples kept for display
pub const HISTORY_CAPACITY: usize = 200;

/// Fixed-capacity FIFO of recent values
///
/// Appending to a full history evicts the oldest value first. Rendering reads
/// a snapshot; nothing but the acquisition loop appends.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl SampleHistory {
    /// Create an empty history holding at most `capacity` values (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest one if full
    pub fn push(&mut self, value: f64) {
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest retained value
    pub fn first(&self) -> Option<f64> {
        self.values.front().copied()
    }

    /// Most recent value
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Copy of the values in append order
    pub fn snapshot(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}
