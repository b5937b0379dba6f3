//! Drafting: one call producing the full report body.
//!
//! This is the only degradable-looking stage that is allowed to fail the
//! run: without a draft there is nothing to critique, refine, or export.
//! An unusable response body, by contrast, degrades to placeholder
//! sections rather than failing, so a malformed-but-successful call still
//! produces a document.

use pipeline::{PipelineError, ReportDraft, Source, Stage};
use tracing::warn;

use crate::gateway::CallGateway;
use crate::parse::parse_json_payload;
use crate::progress::ProgressReporter;
use crate::prompts;

/// Writes the draft from the accepted source pool.
pub async fn run(
    gateway: &CallGateway,
    reporter: &ProgressReporter,
    topic: &str,
    subject: &str,
    subtopics: &[String],
    sources: &[Source],
    max_cited: usize,
) -> Result<ReportDraft, PipelineError> {
    reporter.emit(Stage::Drafting, "Writing report...", 70);

    let request = prompts::draft_request(topic, subject, subtopics, sources, max_cited);
    let response = gateway
        .call(&request)
        .await
        .map_err(|failure| PipelineError::StageFailed {
            stage: Stage::Drafting,
            failure,
        })?;

    let mut draft = match parse_json_payload::<ReportDraft>(&response.text) {
        Some(draft) => draft,
        None => {
            warn!("draft response was not usable JSON; emitting placeholder sections");
            ReportDraft::default()
        }
    };
    draft.fill_missing();
    Ok(draft)
}
