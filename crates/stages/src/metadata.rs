//! Metadata extraction: replace URL-derived placeholder titles with real
//! ones.
//!
//! Titles are first recovered locally from the captured context excerpts.
//! Sources still lacking one are covered by a single batched call; the
//! response maps back by source number. This stage never fails the run:
//! any call or parse failure keeps the URL-pattern metadata, which is
//! always sufficient to format a citation. A cancellation observed before
//! the batched call skips it; the run then terminates at the next stage
//! boundary.

use pipeline::{CancellationToken, ResearchPolicy, Source, SourceMetadata, Stage};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::extract;
use crate::gateway::CallGateway;
use crate::parse::parse_json_payload;
use crate::progress::ProgressReporter;
use crate::prompts;

/// One entry of the batched extraction response, numbered from 1 in
/// listing order.
#[derive(Debug, Deserialize)]
struct BatchEntry {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<String>,
    #[serde(default)]
    year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchPayload {
    #[serde(default)]
    sources: Vec<BatchEntry>,
}

/// Enriches the first `metadata_batch_limit` sources in place.
pub async fn run(
    gateway: &CallGateway,
    policy: &ResearchPolicy,
    cancel: &CancellationToken,
    reporter: &ProgressReporter,
    sources: &mut [Source],
) {
    reporter.emit(
        Stage::ExtractingMetadata,
        "Extracting titles and authors...",
        62,
    );

    let limit = sources.len().min(policy.metadata_batch_limit);
    let mut pending: Vec<usize> = Vec::new();
    for index in 0..limit {
        match extract::extract_title_from_context(&sources[index].context) {
            Some(title) if title.chars().count() > 20 => {
                sources[index].metadata.title = Some(title);
            }
            _ => pending.push(index),
        }
    }

    if pending.is_empty() {
        debug!("all titles recovered locally; no extraction call needed");
        return;
    }
    if cancel.is_cancelled() {
        debug!("cancellation observed; skipping the title extraction call");
        return;
    }

    let request = {
        let entries: Vec<&Source> = pending.iter().map(|&index| &sources[index]).collect();
        prompts::metadata_batch_request(&entries)
    };
    let text = match gateway.call(&request).await {
        Ok(response) => response.text,
        Err(failure) => {
            warn!(%failure, "title extraction call failed; keeping URL-derived metadata");
            return;
        }
    };
    let Some(payload) = parse_json_payload::<BatchPayload>(&text) else {
        warn!("title extraction response was not usable JSON; keeping URL-derived metadata");
        return;
    };

    let mut filled = 0;
    for entry in payload.sources {
        let Some(&source_index) = pending.get(entry.index.wrapping_sub(1)) else {
            continue;
        };
        if assimilate(&mut sources[source_index].metadata, entry) {
            filled += 1;
        }
    }
    debug!(requested = pending.len(), filled, "batched title extraction applied");
}

/// Applies one response entry, keeping existing values unless the returned
/// ones pass validation. Returns whether the title was replaced.
fn assimilate(metadata: &mut SourceMetadata, entry: BatchEntry) -> bool {
    let mut replaced = false;

    if let Some(title) = entry.title {
        let title = title.trim();
        let lowered = title.to_lowercase();
        let placeholder = ["http", "url:", "arxiv preprint", "ieee document"]
            .iter()
            .any(|prefix| lowered.starts_with(prefix));
        if title.chars().count() > 20 && !placeholder {
            metadata.title = Some(extract::truncate_chars(title, 150).to_string());
            replaced = true;
        }
    }

    if let Some(authors) = entry.authors {
        let authors = authors.trim();
        let lowered = authors.to_lowercase();
        if !authors.is_empty() && lowered != "unknown" && lowered != "author unknown" {
            metadata.authors = Some(authors.to_string());
        }
    }

    if let Some(year) = entry.year {
        let year = year.trim();
        if year.len() == 4 && year.chars().all(|ch| ch.is_ascii_digit()) {
            metadata.year = Some(year.to_string());
        }
    }

    replaced
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: Option<&str>, authors: Option<&str>, year: Option<&str>) -> BatchEntry {
        BatchEntry {
            index: 1,
            title: title.map(str::to_string),
            authors: authors.map(str::to_string),
            year: year.map(str::to_string),
        }
    }

    #[test]
    fn valid_titles_replace_url_derived_ones() {
        let mut metadata = SourceMetadata {
            title: Some("MIT Research Article".to_string()),
            ..SourceMetadata::default()
        };
        let replaced = assimilate(
            &mut metadata,
            entry(
                Some("Scaling Laws for Neural Language Models"),
                Some("Kaplan et al."),
                Some("2020"),
            ),
        );
        assert!(replaced);
        assert_eq!(
            metadata.title.as_deref(),
            Some("Scaling Laws for Neural Language Models")
        );
        assert_eq!(metadata.authors.as_deref(), Some("Kaplan et al."));
        assert_eq!(metadata.year.as_deref(), Some("2020"));
    }

    #[test]
    fn placeholder_titles_are_refused() {
        let mut metadata = SourceMetadata::default();
        assert!(!assimilate(
            &mut metadata,
            entry(Some("ArXiv Preprint 2301.04567 full record"), None, None),
        ));
        assert!(!assimilate(
            &mut metadata,
            entry(Some("https://example.edu/a-long-enough-path"), None, None),
        ));
        assert!(!assimilate(&mut metadata, entry(Some("Too short"), None, None)));
        assert!(metadata.title.is_none());
    }

    #[test]
    fn unknown_authors_and_bad_years_are_ignored() {
        let mut metadata = SourceMetadata {
            authors: Some("IEEE Authors".to_string()),
            year: Some("2024".to_string()),
            ..SourceMetadata::default()
        };
        assimilate(
            &mut metadata,
            entry(None, Some("Unknown"), Some("circa 2020")),
        );
        assert_eq!(metadata.authors.as_deref(), Some("IEEE Authors"));
        assert_eq!(metadata.year.as_deref(), Some("2024"));
    }
}
