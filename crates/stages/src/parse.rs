//! Lenient JSON extraction from model output.
//!
//! Reasoning responses are asked to contain only JSON, but in practice
//! arrive wrapped in markdown fences or surrounded by prose. Parsing tries
//! the cleaned text directly first, then falls back to the outermost brace
//! pair. Callers treat `None` as "unusable output" and degrade per stage
//! policy rather than failing the run.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"```(?:json)?").expect("fence pattern must compile")
    })
}

fn brace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)\{.*\}").expect("brace pattern must compile")
    })
}

/// Extracts a `T` from model output, or `None` when no strategy yields one.
pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Option<T> {
    let cleaned = fence_pattern().replace_all(text, "");
    let cleaned = cleaned.trim();

    if let Ok(value) = serde_json::from_str::<T>(cleaned) {
        return Some(value);
    }

    let captured = brace_pattern().find(cleaned)?;
    serde_json::from_str::<T>(captured.as_str()).ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::parse_json_payload;
    use pipeline::ResearchPlan;

    #[test]
    fn parses_bare_json() {
        let plan: ResearchPlan = parse_json_payload(
            r#"{"subtopics": ["a"], "researchQueries": ["q"]}"#,
        )
        .unwrap();
        assert_eq!(plan.subtopics, vec!["a"]);
        assert_eq!(plan.queries, vec!["q"]);
    }

    #[test]
    fn strips_markdown_fences() {
        let text = "```json\n{\"subtopics\": [\"a\"], \"researchQueries\": [\"q\"]}\n```";
        let plan: ResearchPlan = parse_json_payload(text).unwrap();
        assert_eq!(plan.subtopics, vec!["a"]);
    }

    #[test]
    fn recovers_object_embedded_in_prose() {
        let text = "Here is the plan you asked for:\n\n{\"subtopics\": [\"a\"], \
                    \"researchQueries\": [\"q\"]}\n\nLet me know if you need more.";
        let plan: ResearchPlan = parse_json_payload(text).unwrap();
        assert_eq!(plan.queries, vec!["q"]);
    }

    #[test]
    fn multiline_objects_span_the_brace_fallback() {
        let text = "prefix {\n  \"subtopics\": [\"a\"],\n  \"researchQueries\": [\"q\"]\n} suffix";
        let plan: ResearchPlan = parse_json_payload(text).unwrap();
        assert_eq!(plan.subtopics.len(), 1);
    }

    #[test]
    fn unusable_text_yields_none() {
        assert!(parse_json_payload::<ResearchPlan>("no json here").is_none());
        assert!(parse_json_payload::<ResearchPlan>("{broken").is_none());
    }
}
