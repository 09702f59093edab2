//! Rolling history of recent samples for sparkline display.

use crate::HISTORY_LEN;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of the most recent samples, oldest first.
///
/// Starts filled with NaN so consumers can tell a buffer that has not warmed
/// up yet from a real zero reading.
#[derive(Debug, Clone)]
pub struct History {
    values: VecDeque<f64>,
    pushes: usize,
}

impl History {
    /// Creates a history with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_LEN)
    }

    /// Creates a history holding `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: std::iter::repeat(f64::NAN).take(capacity).collect(),
            pushes: 0,
        }
    }

    /// Appends a sample and drops the oldest one.
    pub fn push(&mut self, value: f64) {
        if self.values.is_empty() {
            return;
        }
        self.values.push_back(value);
        self.values.pop_front();
        self.pushes = self.pushes.saturating_add(1);
    }

    /// Returns the samples, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Returns the most recent sample.
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Returns true once every initial sentinel has been pushed out.
    pub fn is_warm(&self) -> bool {
        self.pushes >= self.values.len()
    }

    /// Returns the capacity.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true for a zero-capacity history.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
