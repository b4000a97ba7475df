//! Progress accounting for a batch of segment fetches.
//!
//! Workers only ever increment the shared completed counter; consumers derive
//! rate and ETA from snapshots. Nothing else depends on this state.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Shared counters for one run. Safe to use from many worker threads; the
/// completed count is the only mutated field.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            started: Instant::now(),
        }
    }

    /// Count segments that were already on disk before any fetch, without
    /// emitting an event for them.
    pub fn preload(&self, already_done: usize) {
        self.completed.fetch_add(already_done, Ordering::Relaxed);
    }

    /// Record one completed fetch and return the resulting snapshot.
    pub fn complete_one(&self) -> ProgressStats {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressStats {
        ProgressStats {
            completed: self.completed.load(Ordering::Relaxed),
            total: self.total,
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Snapshot of fetch progress (consumer-friendly).
#[derive(Debug, Clone, Copy)]
pub struct ProgressStats {
    /// Segments completed so far.
    pub completed: usize,
    /// Total number of segments.
    pub total: usize,
    /// Elapsed time since the run started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Completion rate in segments per second (0 if elapsed is 0).
    pub fn segments_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_secs
    }

    /// Estimated seconds remaining (None if rate is 0 and work remains).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total.saturating_sub(self.completed);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.segments_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.completed as f64 / self.total as f64).min(1.0)
    }
}
