//! Delayed, cancellable clearing of the auth error banner.
//!
//! The host drives time: it calls `tick(now)` from its event loop and the
//! task fires once its deadline has passed. Scheduling again supersedes the
//! pending deadline; nothing ever fires twice.

use std::time::{Duration, Instant};

/// How long a failed login/register message stays visible.
pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct ErrorExpiry {
    deadline: Option<Instant>,
}

impl ErrorExpiry {
    /// A delay past what `Instant` can represent never fires.
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = now.checked_add(delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True exactly once, on the first call at or past the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
