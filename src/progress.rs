//! Progress and remaining-time estimation for a reconciliation run

use serde::Serialize;
use std::time::{Duration, Instant};

/// Snapshot emitted after each top-level directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percentage: u8,
    pub remaining: Duration,
    pub message: String,
}

/// Tracks processed directories against the total for one run
#[derive(Debug)]
pub struct ProgressTracker {
    started: Instant,
    processed: usize,
    total: usize,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            started: Instant::now(),
            processed: 0,
            total,
        }
    }

    /// Mark one more directory as processed, using wall-clock elapsed time
    pub fn advance(&mut self) -> ProgressUpdate {
        let elapsed = self.started.elapsed();
        self.record(elapsed)
    }

    /// Mark one more directory as processed after `elapsed` since the start
    pub fn record(&mut self, elapsed: Duration) -> ProgressUpdate {
        self.processed = (self.processed + 1).min(self.total);

        let percentage = percentage(self.processed, self.total);
        let remaining = estimate_remaining(elapsed, self.processed, self.total);

        ProgressUpdate {
            processed: self.processed,
            total: self.total,
            percentage,
            remaining,
            message: format!(
                "Progress: {}/{}, estimated time remaining: {}s",
                self.processed,
                self.total,
                remaining.as_secs()
            ),
        }
    }

    pub fn processed(&self) -> usize {
        self.processed
    }
}

/// `round(processed / total * 100)`; an empty run counts as complete
pub fn percentage(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = processed.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

/// Linear extrapolation from the mean time per processed item, in whole seconds
pub fn estimate_remaining(elapsed: Duration, processed: usize, total: usize) -> Duration {
    if processed == 0 {
        return Duration::ZERO;
    }
    let per_item = elapsed.as_secs_f64() / processed as f64;
    let left = total.saturating_sub(processed) as f64;
    Duration::from_secs((per_item * left) as u64)
}
