//! Wall-clock budget for a running simulator process.

use std::time::{Duration, Instant};

/// Outcome of checking the guard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuardDecision {
    /// Keep waiting.
    Continue,
    /// The budget is spent.
    Exceeded {
        /// Configured limit.
        limit: Duration,
        /// Time elapsed when the check fired.
        observed: Duration,
    },
}

/// Tracks elapsed time against an optional limit.
#[derive(Debug)]
pub struct WallClockGuard {
    limit: Option<Duration>,
    start: Instant,
}

impl WallClockGuard {
    /// Starts the clock. `None` never expires.
    pub fn new(limit: Option<Duration>) -> Self {
        Self {
            limit,
            start: Instant::now(),
        }
    }

    /// Configured limit.
    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Compares elapsed time with the limit.
    pub fn check(&self) -> GuardDecision {
        let observed = self.start.elapsed();
        match self.limit {
            Some(limit) if observed > limit => GuardDecision::Exceeded { limit, observed },
            _ => GuardDecision::Continue,
        }
    }

    /// Time since the guard was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// How long to sleep before the next poll: short at first, capped at 50 ms, never
    /// past the deadline.
    pub fn poll_interval(&self) -> Duration {
        let elapsed = self.elapsed();
        let base = (elapsed / 20).clamp(Duration::from_millis(2), Duration::from_millis(50));
        match self.limit {
            Some(limit) if limit > elapsed => base.min(limit - elapsed + Duration::from_millis(1)),
            _ => base,
        }
    }
}
