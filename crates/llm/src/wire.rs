//! Serde shapes for the Anthropic Messages API.
//!
//! Only the fields this pipeline uses are modelled. Response content blocks
//! are parsed tolerantly: any block type deserialises, and only blocks that
//! carry text contribute to the flattened output, so search-tool result
//! blocks pass through harmlessly.

use serde::{Deserialize, Serialize};

/// Identifier of the hosted web-search tool.
const WEB_SEARCH_TOOL_TYPE: &str = "web_search_20250305";
const WEB_SEARCH_TOOL_NAME: &str = "web_search";

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Tool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
}

impl MessagesRequest {
    /// Builds a single-user-message request, attaching the web-search tool
    /// when asked for.
    pub fn single_user(model: &str, prompt: &str, max_tokens: u32, web_search: bool) -> Self {
        Self {
            model: model.to_string(),
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
            tools: web_search.then(|| {
                vec![Tool {
                    kind: WEB_SEARCH_TOOL_TYPE,
                    name: WEB_SEARCH_TOOL_NAME,
                }]
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Response body
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One response content block. `kind` distinguishes text from tool blocks;
/// only text blocks carry a `text` field.
#[derive(Debug, Deserialize)]
pub(crate) struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Concatenates the text of every text block, in order.
    pub fn flattened_text(&self) -> String {
        let mut out = String::new();
        for block in &self.content {
            if block.kind == "text" {
                if let Some(text) = &block.text {
                    out.push_str(text);
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// The service's structured error envelope (`{"type": "error", "error":
/// {"type": ..., "message": ...}}`).
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_tools_unless_searching() {
        let plain = MessagesRequest::single_user("claude-sonnet-4-20250514", "Hi", 1000, false);
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("tools").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hi");
        assert_eq!(json["max_tokens"], 1000);

        let searching = MessagesRequest::single_user("claude-sonnet-4-20250514", "Find", 1500, true);
        let json = serde_json::to_value(&searching).unwrap();
        assert_eq!(json["tools"][0]["type"], "web_search_20250305");
        assert_eq!(json["tools"][0]["name"], "web_search");
    }

    #[test]
    fn flattening_concatenates_text_blocks_and_skips_tool_blocks() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "Part one. "},
                {"type": "server_tool_use", "id": "tu_1", "name": "web_search", "input": {}},
                {"type": "web_search_tool_result", "tool_use_id": "tu_1", "content": []},
                {"type": "text", "text": "Part two."}
            ]
        }"#;
        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.flattened_text(), "Part one. Part two.");
    }

    #[test]
    fn missing_content_flattens_to_empty() {
        let response: MessagesResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.flattened_text(), "");
    }

    #[test]
    fn error_envelope_parses() {
        let body = r#"{
            "type": "error",
            "error": {"type": "rate_limit_error", "message": "Too many requests"}
        }"#;
        let envelope: ApiErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.kind, "rate_limit_error");
        assert_eq!(envelope.error.message, "Too many requests");
    }
}
