//! Retry back-off schedules.
//!
//! The call gateway consults a [`Backoff`] to decide how long to wait before
//! each retry. Two schedules are configured in practice: a longer one for
//! throttling responses and a shorter one for transient faults. The trait
//! exists so alternative schedules (exponential, jittered) can be substituted
//! without touching the retry loop.

use std::time::Duration;

/// A retry delay schedule.
pub trait Backoff: Send + Sync {
    /// Delay to wait before retry number `retry` (1-based: the delay after
    /// the first failed attempt is `delay_for(1)`).
    fn delay_for(&self, retry: u32) -> Duration;
}

/// A fixed table of delays; retries beyond the table reuse the final entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedBackoff {
    steps: Vec<Duration>,
}

impl FixedBackoff {
    /// Creates a schedule from explicit steps. Returns `None` if `steps` is
    /// empty — a schedule must always be able to produce a delay.
    #[must_use]
    pub fn new(steps: Vec<Duration>) -> Option<Self> {
        if steps.is_empty() {
            None
        } else {
            Some(Self { steps })
        }
    }

    /// Convenience constructor from whole seconds.
    #[must_use]
    pub fn from_secs(steps: &[u64]) -> Option<Self> {
        Self::new(steps.iter().map(|s| Duration::from_secs(*s)).collect())
    }
}

impl Backoff for FixedBackoff {
    fn delay_for(&self, retry: u32) -> Duration {
        let index = (retry.max(1) as usize - 1).min(self.steps.len() - 1);
        self.steps[index]
    }
}
