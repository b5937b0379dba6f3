//! The Anthropic Messages API provider.

use async_trait::async_trait;
use pipeline::{
    CallError, GenerationRequest, GenerationResponse, ModelProvider, PipelineError,
    ProviderConfig,
};
use tracing::{debug, warn};

use crate::classify;
use crate::wire::{ApiErrorEnvelope, MessagesRequest, MessagesResponse};

/// Protocol version header sent with every request.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// How much of an unstructured error body is kept for the failure message.
const ERROR_BODY_PREVIEW: usize = 200;

/// [`ModelProvider`] implementation over the Anthropic Messages API.
///
/// Holds a connection-pooling HTTP client for the process lifetime. No
/// request timeout is configured here: the per-attempt ceiling is enforced by
/// the call gateway's clock so it can be tested without real time passing.
#[derive(Debug)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl AnthropicProvider {
    /// Creates a provider with an explicit API key.
    pub fn new(config: &ProviderConfig, api_key: impl Into<String>) -> Result<Self, PipelineError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PipelineError::Configuration {
                message: "API key must not be empty".to_string(),
            });
        }
        let client = reqwest::Client::builder().build().map_err(|error| {
            PipelineError::Configuration {
                message: format!("failed to build HTTP client: {error}"),
            }
        })?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Creates a provider reading the key from the environment variable the
    /// configuration names.
    pub fn from_env(config: &ProviderConfig) -> Result<Self, PipelineError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            PipelineError::Configuration {
                message: format!(
                    "environment variable {} is not set; it must hold the API key",
                    config.api_key_env
                ),
            }
        })?;
        Self::new(config, api_key)
    }

    /// The configured model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError> {
        let body = MessagesRequest::single_user(
            &self.model,
            &request.prompt,
            request.max_tokens,
            request.web_search,
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|error| classify::classify_transport(&error))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = classify::parse_retry_after(
                response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok()),
            );
            let body_text = response.text().await.unwrap_or_default();
            let envelope: Option<ApiErrorEnvelope> = serde_json::from_str(&body_text).ok();
            let (error_kind, message) = match &envelope {
                Some(envelope) => (
                    Some(envelope.error.kind.as_str()),
                    envelope.error.message.clone(),
                ),
                None => (None, preview(&body_text, status)),
            };
            let error =
                classify::classify_response(status.as_u16(), error_kind, &message, retry_after);
            warn!(
                status = status.as_u16(),
                category = error.category(),
                "reasoning call failed"
            );
            return Err(error);
        }

        let body_text = response.text().await.map_err(|error| CallError::Transient {
            status: Some(status.as_u16()),
            message: format!("failed reading response body: {error}"),
        })?;
        let parsed: MessagesResponse =
            serde_json::from_str(&body_text).map_err(|error| CallError::Transient {
                status: Some(status.as_u16()),
                message: format!("unparseable response body: {error}"),
            })?;

        let text = parsed.flattened_text();
        debug!(chars = text.len(), "reasoning call succeeded");
        Ok(GenerationResponse { text })
    }
}

/// Short human-readable message for an error body with no structured
/// envelope.
fn preview(body: &str, status: reqwest::StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(ERROR_BODY_PREVIEW).collect()
    }
}
