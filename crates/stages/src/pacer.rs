//! The global pacing slot.
//!
//! One timestamp — when the last call attempt completed — is the only shared
//! mutable state in the whole pipeline. The pacer guards it with an async
//! mutex; a caller holds the slot for its entire logical call (all attempts),
//! so concurrent callers serialize here and the minimum-interval guarantee
//! holds globally, not per caller.

use std::time::{Duration, Instant};

use pipeline::Clock;
use tokio::sync::{Mutex, MutexGuard};
use tracing::trace;

/// Owns the last-completion timestamp and the configured minimum spacing.
#[derive(Debug)]
pub struct Pacer {
    min_interval: Duration,
    last_completed: Mutex<Option<Instant>>,
}

impl Pacer {
    /// Creates a pacer with no calls recorded yet; the first call proceeds
    /// without waiting.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_completed: Mutex::new(None),
        }
    }

    /// Takes exclusive ownership of the pacing slot. Held across all attempts
    /// of one logical call; release is by dropping the returned slot.
    pub async fn acquire(&self) -> PacedSlot<'_> {
        PacedSlot {
            min_interval: self.min_interval,
            guard: self.last_completed.lock().await,
        }
    }
}

/// Exclusive hold on the pacing slot.
pub struct PacedSlot<'a> {
    min_interval: Duration,
    guard: MutexGuard<'a, Option<Instant>>,
}

impl PacedSlot<'_> {
    /// Waits out whatever remains of the minimum interval since the last
    /// completed attempt. Returns immediately when enough time has already
    /// passed or no call has completed yet.
    pub async fn pace(&self, clock: &dyn Clock) {
        if let Some(last) = *self.guard {
            let elapsed = clock.now().saturating_duration_since(last);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(wait_ms = wait.as_millis() as u64, "pacing before call");
                clock.sleep(wait).await;
            }
        }
    }

    /// Records that an attempt just completed. Called after every attempt,
    /// successful or not, so spacing is measured from when the previous call
    /// returned.
    pub fn stamp(&mut self, completed_at: Instant) {
        *self.guard = Some(completed_at);
    }
}
