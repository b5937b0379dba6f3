//! Failure classification for the Messages API.
//!
//! Maps HTTP outcomes onto the [`CallError`] taxonomy the gateway retries
//! against. The service's own error envelope takes precedence over the bare
//! status code, since the status alone cannot distinguish, say, a throttling
//! 429 carrying a retry hint from an equally-shaped proxy response.

use std::time::Duration;

use pipeline::{CallError, FatalKind};

/// Classifies a non-success HTTP response.
///
/// `error_kind` is the `error.type` from the service's error envelope, when
/// the body parsed; `retry_after` is the parsed `retry-after` header.
pub fn classify_response(
    status: u16,
    error_kind: Option<&str>,
    message: &str,
    retry_after: Option<Duration>,
) -> CallError {
    if let Some(kind) = error_kind {
        match kind {
            "rate_limit_error" => return CallError::RateLimited { retry_after },
            "authentication_error" | "permission_error" => {
                return CallError::Fatal {
                    kind: FatalKind::Authentication,
                    message: message.to_string(),
                };
            }
            "invalid_request_error" | "not_found_error" | "request_too_large" => {
                return CallError::Fatal {
                    kind: FatalKind::MalformedRequest,
                    message: message.to_string(),
                };
            }
            "overloaded_error" | "api_error" => {
                return CallError::Transient {
                    status: Some(status),
                    message: message.to_string(),
                };
            }
            kind if kind.contains("content") => {
                return CallError::Fatal {
                    kind: FatalKind::ContentPolicy,
                    message: message.to_string(),
                };
            }
            _ => {}
        }
    }

    match status {
        429 => CallError::RateLimited { retry_after },
        401 | 403 => CallError::Fatal {
            kind: FatalKind::Authentication,
            message: message.to_string(),
        },
        400 | 404 | 413 | 422 => CallError::Fatal {
            kind: FatalKind::MalformedRequest,
            message: message.to_string(),
        },
        _ => CallError::Transient {
            status: Some(status),
            message: message.to_string(),
        },
    }
}

/// Classifies a transport-level failure (connection refused, DNS, dropped
/// stream). Always transient: the request never reached a verdict.
pub fn classify_transport(error: &reqwest::Error) -> CallError {
    CallError::Transient {
        status: error.status().map(|s| s.as_u16()),
        message: error.to_string(),
    }
}

/// Parses a `retry-after` header value. Only the delay-seconds form is
/// honoured; the HTTP-date form is ignored.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
