//! Runtime-backed clock.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pipeline::Clock;

/// The production [`Clock`]: monotonic [`Instant`]s and runtime timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
