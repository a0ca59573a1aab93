//! Timing utilities for debounced edits and progress estimation.
//!
//! Edits arrive in bursts (a drag produces dozens of updates per second),
//! while history snapshots and autosaves should only happen once the burst
//! settles. [`SettleTimer`] tracks that quiet period against caller-supplied
//! instants so the editing thread stays in control of when work runs.

use std::time::{Duration, Instant};

/// A debounce timer that fires once after activity has been quiet for
/// a fixed settle window.
#[derive(Debug, Clone)]
pub struct SettleTimer {
    settle: Duration,
    last_activity: Option<Instant>,
}

impl SettleTimer {
    /// Create a timer with the given quiet window.
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            last_activity: None,
        }
    }

    /// Create a timer from a millisecond window.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// Record activity at `now`, restarting the quiet window.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    /// Whether activity is pending (touched but not yet fired).
    pub fn is_pending(&self) -> bool {
        self.last_activity.is_some()
    }

    /// Returns true exactly once when the quiet window has elapsed since the
    /// last touch. The timer disarms itself when it fires.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.last_activity {
            Some(last) if now.saturating_duration_since(last) >= self.settle => {
                self.last_activity = None;
                true
            }
            _ => false,
        }
    }

    /// Disarm without firing.
    pub fn cancel(&mut self) {
        self.last_activity = None;
    }

    /// Configured quiet window.
    pub fn settle(&self) -> Duration {
        self.settle
    }
}

/// Remaining-time estimator for long-running jobs reporting fractional progress.
#[derive(Debug, Clone)]
pub struct EtaEstimator {
    started: Instant,
}

impl EtaEstimator {
    /// Start estimating from now.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    /// Start estimating from a known instant.
    pub fn from_instant(started: Instant) -> Self {
        Self { started }
    }

    /// Seconds elapsed since start.
    pub fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    /// Estimated seconds remaining given `progress` in `[0, 1]` and the
    /// elapsed wall time. `None` until any progress has been made.
    pub fn eta_secs(progress: f64, elapsed_secs: f64) -> Option<f64> {
        let progress = progress.clamp(0.0, 1.0);
        if progress <= 0.0 {
            return None;
        }
        Some(((elapsed_secs / progress) - elapsed_secs).max(0.0))
    }

    /// Estimate against this estimator's own start instant.
    pub fn eta_now(&self, progress: f64) -> Option<f64> {
        Self::eta_secs(progress, self.elapsed_secs())
    }
}

/// Convert seconds to a `Duration`, treating negatives and NaN as zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}
