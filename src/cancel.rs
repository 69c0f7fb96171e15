//! Cooperative cancellation for in-flight conversions.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct Shared {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared cancellation flag with an optional deadline.
///
/// Clones observe the same flag. A token is considered cancelled once
/// [`cancel`](Self::cancel) has been called on any clone or its deadline
/// has passed. Threads blocked in [`sleep`](Self::sleep) are woken as soon
/// as the token is cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    shared: Arc<Shared>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that cancels itself at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            shared: Arc::default(),
            deadline: Some(deadline),
        }
    }

    /// Token that cancels itself `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        *self.shared.cancelled.lock() = true;
        self.shared.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.shared.cancelled.lock() || self.deadline_passed(Instant::now())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sleep for `duration`, waking early if the token is cancelled.
    ///
    /// Returns `true` if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let end = Instant::now() + duration;
        let wake_at = match self.deadline {
            Some(deadline) => end.min(deadline),
            None => end,
        };

        let mut cancelled = self.shared.cancelled.lock();
        loop {
            if *cancelled {
                return false;
            }
            let now = Instant::now();
            if self.deadline_passed(now) {
                return false;
            }
            if now >= end {
                return true;
            }
            // Spurious wake-ups and timeouts both land back at the checks.
            self.shared.wake.wait_until(&mut cancelled, wake_at);
        }
    }

    fn deadline_passed(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}
