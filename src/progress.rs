//! Cooperative cancellation and progress reporting for long-running work.
//!
//! Enumeration and simplification poll a [`ProgressTracker`] between major
//! iterations. A tracker is cheap to clone; all clones share one flag, so a
//! caller can hand one clone to a worker and cancel from another thread
//! (or from a timer of their own).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::tri_error::TriError;

#[derive(Debug, Default)]
struct TrackerState {
    cancelled: AtomicBool,
    finished: AtomicBool,
    /// Percentage scaled by 100 (so 10000 = 100%).
    percent_x100: AtomicU64,
    steps: AtomicU64,
}

/// Shared cancellation token plus coarse progress counter.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    state: Arc<TrackerState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Running operations notice at their next poll.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Relaxed)
    }

    /// Poll point: returns `Err(Cancelled)` once cancellation was requested.
    #[inline]
    pub fn poll(&self) -> Result<(), TriError> {
        self.state.steps.fetch_add(1, Ordering::Relaxed);
        if self.is_cancelled() {
            Err(TriError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Record progress as a percentage in `[0, 100]`, then poll.
    pub fn set_percent(&self, percent: f64) -> Result<(), TriError> {
        let clamped = percent.clamp(0.0, 100.0);
        self.state
            .percent_x100
            .store((clamped * 100.0) as u64, Ordering::Relaxed);
        self.poll()
    }

    pub fn percent(&self) -> f64 {
        self.state.percent_x100.load(Ordering::Relaxed) as f64 / 100.0
    }

    /// Number of poll points passed so far.
    pub fn steps(&self) -> u64 {
        self.state.steps.load(Ordering::Relaxed)
    }

    pub fn set_finished(&self) {
        self.state.percent_x100.store(10_000, Ordering::Relaxed);
        self.state.finished.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Relaxed)
    }
}

/// Poll an optional tracker.
#[inline]
pub(crate) fn poll(tracker: Option<&ProgressTracker>) -> Result<(), TriError> {
    match tracker {
        Some(t) => t.poll(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_cancellation() {
        let a = ProgressTracker::new();
        let b = a.clone();
        assert!(a.poll().is_ok());
        b.cancel();
        assert_eq!(a.poll(), Err(TriError::Cancelled));
        assert_eq!(a.steps(), 2);
    }

    #[test]
    fn percent_is_clamped() {
        let t = ProgressTracker::new();
        t.set_percent(250.0).unwrap();
        assert_eq!(t.percent(), 100.0);
        t.set_finished();
        assert!(t.is_finished());
    }
}
