//! The rate-limited call gateway.
//!
//! Every outbound request to the reasoning service goes through
//! [`CallGateway::call`], which enforces, in one place:
//!
//! - **Pacing** — at least the configured minimum interval between the
//!   completion of one attempt and the start of the next, globally.
//! - **Timeout** — each attempt races the clock; a timed-out attempt counts
//!   against the retry budget like any other retryable failure.
//! - **Bounded retries** — throttling responses follow the escalating
//!   throttle schedule, timeouts and transient faults the shorter transient
//!   schedule, both capped at the configured attempt maximum. A service
//!   `retry-after` hint can lengthen a scheduled delay, never shorten it.
//! - **Fail-fast** — non-retryable errors surface immediately without
//!   consuming retry budget.
//!
//! The provider adapter performs exactly one attempt per invocation, so this
//! is the only retry loop in the system.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    Backoff, CallError, CallFailure, Clock, GenerationRequest, GenerationResponse,
    ModelProvider, PacingConfig, PipelineError, RetryPolicy,
};
use tracing::{debug, warn};

use crate::pacer::Pacer;

/// Pacing, timeout, and retry enforcement around a [`ModelProvider`].
pub struct CallGateway {
    provider: Arc<dyn ModelProvider>,
    clock: Arc<dyn Clock>,
    pacer: Pacer,
    throttle_backoff: Box<dyn Backoff>,
    transient_backoff: Box<dyn Backoff>,
    max_attempts: u32,
    call_timeout: Duration,
    attempts_made: AtomicU64,
}

impl CallGateway {
    /// Builds a gateway from the pacing policy.
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        clock: Arc<dyn Clock>,
        pacing: &PacingConfig,
    ) -> Result<Self, PipelineError> {
        pacing.validate()?;
        Ok(Self {
            provider,
            clock,
            pacer: Pacer::new(pacing.min_interval()),
            throttle_backoff: Box::new(pacing.throttle_backoff()?),
            transient_backoff: Box::new(pacing.transient_backoff()?),
            max_attempts: pacing.max_attempts,
            call_timeout: pacing.call_timeout(),
            attempts_made: AtomicU64::new(0),
        })
    }

    /// Total attempts made through this gateway, including retries. Reported
    /// in run statistics.
    pub fn attempts_made(&self) -> u64 {
        self.attempts_made.load(Ordering::Relaxed)
    }

    /// Executes one logical call: pace, attempt, classify, retry or fail.
    ///
    /// Holds the global pacing slot for the whole call, so concurrent callers
    /// serialize and the minimum-interval guarantee is preserved across them.
    pub async fn call(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, CallFailure> {
        let mut slot = self.pacer.acquire().await;
        let mut attempt: u32 = 1;
        loop {
            slot.pace(self.clock.as_ref()).await;
            let outcome = self.attempt(request).await;
            slot.stamp(self.clock.now());
            self.attempts_made.fetch_add(1, Ordering::Relaxed);

            let error = match outcome {
                Ok(response) => {
                    debug!(attempt, "call succeeded");
                    return Ok(response);
                }
                Err(error) => error,
            };

            match error.retry_policy() {
                RetryPolicy::NonRetryable => {
                    warn!(attempt, category = error.category(), "call failed fatally");
                    return Err(CallFailure {
                        error,
                        attempts: attempt,
                    });
                }
                RetryPolicy::Retryable { after } => {
                    if attempt >= self.max_attempts {
                        warn!(
                            attempts = attempt,
                            category = error.category(),
                            "retry budget exhausted"
                        );
                        return Err(CallFailure {
                            error,
                            attempts: attempt,
                        });
                    }

                    let scheduled = self.backoff_for(&error).delay_for(attempt);
                    let delay = match after {
                        Some(hint) if hint > scheduled => hint,
                        _ => scheduled,
                    };
                    debug!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        category = error.category(),
                        "backing off before retry"
                    );
                    self.clock.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One attempt, bounded by the per-attempt ceiling. The provider branch
    /// is polled first so a response that is already available wins over an
    /// expired timer.
    async fn attempt(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError> {
        tokio::select! {
            biased;
            result = self.provider.generate(request) => result,
            _ = self.clock.sleep(self.call_timeout) => Err(CallError::Timeout {
                limit: self.call_timeout,
            }),
        }
    }

    /// Throttling gets the escalating schedule; timeouts and transient
    /// faults the shorter one.
    fn backoff_for(&self, error: &CallError) -> &dyn Backoff {
        match error {
            CallError::RateLimited { .. } => self.throttle_backoff.as_ref(),
            _ => self.transient_backoff.as_ref(),
        }
    }
}
