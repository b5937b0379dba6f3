//! Reasoning-service infrastructure adapter.
//!
//! Implements the [`pipeline::ModelProvider`] port over the Anthropic
//! Messages API. Additional providers become new implementations of the same
//! port in this crate, without any changes to the `pipeline` crate.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting, response parsing,
//! and failure classification live here. One call, one attempt: pacing,
//! retries, and timeouts belong to the call gateway, so this adapter never
//! sleeps and never re-sends.

pub mod classify;
pub mod provider;
mod wire;

pub use provider::AnthropicProvider;
