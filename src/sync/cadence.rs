//! Drift-corrected polling deadlines.

use std::time::Duration;
use tokio::time::Instant;

/// Default target interval between cycle starts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Schedules cycle starts at a fixed interval without accumulating drift.
///
/// The next deadline is `max(now, previous_deadline + interval)`: a slow
/// cycle is followed immediately by the next one, and the schedule then
/// resumes from the corrected deadline.
#[derive(Debug, Clone)]
pub struct Cadence {
    interval: Duration,
    deadline: Instant,
}

impl Cadence {
    /// Start a schedule whose first deadline is `now`.
    pub fn start(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            deadline: now,
        }
    }

    /// Current deadline.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Target interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance to the next deadline after a cycle finished at `now`.
    pub fn advance(&mut self, now: Instant) -> Instant {
        self.deadline = (self.deadline + self.interval).max(now);
        self.deadline
    }
}
