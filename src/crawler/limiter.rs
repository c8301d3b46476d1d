//! Global request rate limiter
//!
//! Spaces grants evenly across all concurrent workers so the catalogue
//! never sees more than the configured request rate. Waiters are served
//! in arrival order and can be released early by cancellation.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Returned from [`RateLimiter::acquire`] when the batch was cancelled
/// while the caller was waiting for its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Paces outgoing requests to a fixed rate.
///
/// Each `acquire` reserves the next free time slot under a fair mutex, so
/// grants are handed out first-come-first-served and spaced at least
/// `1/rate` apart regardless of how many workers are waiting.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `requests_per_second` grants per second.
    ///
    /// A non-positive rate is treated as "no limiting".
    pub fn new(requests_per_second: f64) -> Self {
        let interval = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::ZERO
        };

        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Blocks until this caller's slot comes up, or until cancellation.
    ///
    /// Returns `Err(Cancelled)` instead of a grant if `cancel` fires while
    /// waiting. Once a slot is reserved it stays consumed either way; the
    /// rate bound is about spacing, not about refunds.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Cancelled> {
        if cancel.is_cancelled() {
            return Err(Cancelled);
        }

        let deadline = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(at) if at > now => at,
                _ => now,
            };
            *next_slot = Some(slot + self.interval);
            slot
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep_until(deadline) => Ok(()),
        }
    }
}
