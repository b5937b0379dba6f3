//! Call-level and run-level error types for the Monograph pipeline domain.
//!
//! [`CallError`] classifies a single failed attempt against the remote
//! reasoning service; [`CallFailure`] is an exhausted call (the terminal error
//! after retries); [`PipelineError`] covers conditions that end the run.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that
//! participates in retry decisions must be able to produce a [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Stage;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Returned by infrastructure error types to let the call gateway decide
/// whether to re-invoke an operation without escalating.
///
/// ## Rules
///
/// - `Retryable` errors: throttling responses, per-attempt timeouts, transient
///   service faults (HTTP 5xx, dropped connections).
/// - `NonRetryable` errors: malformed requests, authentication failures,
///   content-policy refusals. Retrying these wastes paced call slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt (e.g. derived from a
        /// `retry-after` response header). `None` means apply the caller's
        /// own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried; the failure surfaces immediately.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Call-level errors
// ---------------------------------------------------------------------------

/// Why a non-retryable call attempt can never succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalKind {
    /// The request itself was rejected as invalid (HTTP 400).
    MalformedRequest,
    /// Credentials are missing, expired, or lack permission (HTTP 401/403).
    Authentication,
    /// The service refused the content of the request.
    ContentPolicy,
}

impl std::fmt::Display for FatalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::MalformedRequest => "malformed request",
            Self::Authentication => "authentication failure",
            Self::ContentPolicy => "content policy refusal",
        };
        f.write_str(text)
    }
}

/// Classification of a single failed attempt against the reasoning service.
///
/// Produced by the provider adapter (from HTTP status codes and transport
/// faults) and by the call gateway (per-attempt timeout). The gateway maps
/// each variant through [`CallError::retry_policy`] to drive its retry loop.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum CallError {
    /// The service is throttling us (HTTP 429).
    ///
    /// `retry_after` carries the service's own hint when the response included
    /// one; the gateway honours it as a lower bound on the next delay.
    #[error("rate limited by the service")]
    RateLimited {
        /// Parsed `retry-after` header, if present.
        retry_after: Option<Duration>,
    },

    /// The attempt exceeded the per-attempt time ceiling.
    #[error("call exceeded the {limit:?} time ceiling")]
    Timeout {
        /// The ceiling that was exceeded.
        limit: Duration,
    },

    /// A transient service or transport fault (HTTP 5xx, dropped connection).
    #[error("transient service failure: {message}")]
    Transient {
        /// HTTP status code, when the fault produced one.
        status: Option<u16>,
        /// Human-readable description of the fault.
        message: String,
    },

    /// A fault that retrying cannot fix.
    #[error("{kind}: {message}")]
    Fatal {
        /// Why the request can never succeed as-is.
        kind: FatalKind,
        /// Human-readable description from the service, when available.
        message: String,
    },
}

impl CallError {
    /// Maps this error to its retry decision.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Timeout { .. } | Self::Transient { .. } => RetryPolicy::Retryable { after: None },
            Self::Fatal { .. } => RetryPolicy::NonRetryable,
        }
    }

    /// Short classification tag used in log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::Transient { .. } => "transient",
            Self::Fatal { .. } => "fatal",
        }
    }
}

/// A call that the gateway has given up on.
///
/// Wraps the final attempt's [`CallError`] together with how many attempts
/// were made, so stage-level handling can distinguish "exhausted retries"
/// from "failed fast".
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{error} (after {attempts} attempt(s))")]
pub struct CallFailure {
    /// The error from the final attempt.
    pub error: CallError,
    /// Total attempts made, including the first.
    pub attempts: u32,
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that end a report run.
///
/// Every variant that can occur mid-run records the [`Stage`] the run had
/// reached, so the operator always learns *where* the pipeline stopped.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PipelineError {
    /// A stage's remote call failed after the gateway exhausted its attempts
    /// (or failed fast on a non-retryable fault).
    #[error("{stage} failed: {failure}")]
    StageFailed {
        /// Stage that was executing when the call failed.
        stage: Stage,
        /// The exhausted call.
        failure: CallFailure,
    },

    /// Research finished with fewer credible sources than the report minimum.
    ///
    /// Produced by: the research stage, after all queries have run.
    #[error("only {accepted} credible source(s) found; need at least {required}")]
    InsufficientSources {
        /// Sources admitted to the citation pool.
        accepted: usize,
        /// Configured minimum for a report.
        required: usize,
    },

    /// The run was cancelled cooperatively.
    #[error("run cancelled during {stage}")]
    Cancelled {
        /// Stage that was executing when cancellation was observed.
        stage: Stage,
    },

    /// The report request failed validation before the run started.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the rejected field.
        message: String,
    },

    /// The pipeline configuration is invalid.
    ///
    /// Produced at load time; a run never starts with an invalid config.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl PipelineError {
    /// Actionable advice to show the requester alongside the error, when the
    /// failure has a known remedy.
    pub fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InsufficientSources { .. } => Some(
                "Try broadening the topic or rephrasing it so searches reach more \
                 academic domains.",
            ),
            Self::StageFailed { failure, .. } => match failure.error.retry_policy() {
                RetryPolicy::Retryable { .. } => Some(
                    "The service kept throttling or timing out; wait a few minutes \
                     before resubmitting the request.",
                ),
                RetryPolicy::NonRetryable => None,
            },
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
