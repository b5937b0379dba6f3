//! Port traits for the remote reasoning service and the clock.
//!
//! The domain never talks to the network or the runtime directly. The call
//! gateway drives a [`ModelProvider`] (implemented over HTTP in the `llm`
//! crate) and schedules through a [`Clock`] (implemented over the async
//! runtime in the `stages` crate). Tests substitute scripted providers and a
//! fake clock, which is what makes the pacing and retry behaviour testable
//! without real time passing.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::errors::CallError;

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// One prompt for the reasoning service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// The user-role prompt text.
    pub prompt: String,
    /// Output token ceiling for this call.
    pub max_tokens: u32,
    /// Whether the service's web-search tool is offered for this call.
    pub web_search: bool,
}

impl GenerationRequest {
    /// Default output ceiling when a stage does not set one.
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;

    /// Creates a plain text request with the default token ceiling and no
    /// web search.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            web_search: false,
        }
    }

    /// Sets the output token ceiling.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Offers the web-search tool to the service for this call.
    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }
}

/// The text produced by a successful call.
///
/// Multi-block responses are already flattened: the adapter concatenates all
/// text blocks (search-result blocks carry no text and contribute nothing).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    /// Concatenated text content.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// The remote reasoning service.
///
/// One call, one attempt: implementations perform no retries, no pacing, and
/// no timeouts of their own. All of that lives in the call gateway so the
/// policy is enforced in exactly one place.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Executes a single attempt and classifies any failure.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError>;
}

/// Time source and sleep facility.
///
/// The gateway and pacer never call runtime timers directly; they go through
/// this trait so tests can run the full retry/pacing schedule instantly.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Suspends the caller for `duration`.
    async fn sleep(&self, duration: Duration);
}
