//! Historical lag tracking for sparklines.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Maximum number of lag samples to keep.
const MAX_HISTORY_SIZE: usize = 120;

/// Bounded history of observed lag values.
///
/// Independent of [`LagTrendEstimator`](super::LagTrendEstimator): the estimator
/// keeps only its anchors, this keeps a window for visual trend indicators.
#[derive(Debug, Clone, Default)]
pub struct LagHistory {
    samples: VecDeque<(DateTime<Utc>, u64)>,
}

impl LagHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new lag sample
    pub fn record(&mut self, at: DateTime<Utc>, seconds_behind: u64) {
        self.samples.push_back((at, seconds_behind));
        if self.samples.len() > MAX_HISTORY_SIZE {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<(DateTime<Utc>, u64)> {
        self.samples.back().copied()
    }

    /// Largest lag in the window.
    pub fn peak(&self) -> Option<u64> {
        self.samples.iter().map(|(_, lag)| *lag).max()
    }

    /// Get sparkline data (normalized to 0-7 for 8 bar levels), oldest first.
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn sparkline(&self) -> Vec<u8> {
        if self.samples.len() < 2 {
            return Vec::new();
        }

        let max = self.peak().unwrap_or(0);
        let min = self.samples.iter().map(|(_, lag)| *lag).min().unwrap_or(0);
        let range = (max - min).max(1) as f64;

        self.samples
            .iter()
            .map(|(_, lag)| {
                let normalized = ((lag - min) as f64 / range * 7.0) as u8;
                normalized.min(7)
            })
            .collect()
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
