//! Fixed-length recency buffers for trend display

use std::collections::VecDeque;

use serde::Serialize;

/// Fixed-size FIFO of the most recent readings for one sensor
///
/// Starts out filled with zeros so trend plots begin from a flat baseline;
/// every insert evicts the oldest entry, so the length never changes.
#[derive(Debug, Clone, Serialize)]
pub struct HistoricalWindow {
    values: VecDeque<f64>,
}

impl HistoricalWindow {
    /// Create a window of `len` zeroed readings
    pub fn new(len: usize) -> Self {
        Self {
            values: std::iter::repeat(0.0).take(len).collect(),
        }
    }

    /// Push the newest reading, evicting the oldest
    pub fn push(&mut self, value: f64) {
        if self.values.pop_front().is_some() {
            self.values.push_back(value);
        }
    }

    /// Number of readings held (constant for the window's lifetime)
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the window holds no readings (only for zero-length windows)
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Readings oldest-first, as a plain vector for the render layer
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// Iterate readings oldest-first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}
