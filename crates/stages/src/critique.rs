//! Critiquing: score the draft for relevance and citation quality.
//!
//! Advisory only. A failed call or unusable response degrades to the
//! citation-count heuristic; the run proceeds either way and the scores
//! land in the final summary.

use pipeline::{Critique, ReportDraft, Stage};
use tracing::warn;

use crate::gateway::CallGateway;
use crate::parse::parse_json_payload;
use crate::progress::ProgressReporter;
use crate::prompts;

/// Scores the draft, degrading to the local heuristic when the service
/// cannot.
pub async fn run(
    gateway: &CallGateway,
    reporter: &ProgressReporter,
    topic: &str,
    draft: &ReportDraft,
) -> Critique {
    reporter.emit(Stage::Critiquing, "Quality check...", 85);

    let request = prompts::critique_request(topic, draft);
    match gateway.call(&request).await {
        Ok(response) => match parse_json_payload::<Critique>(&response.text) {
            // An all-defaults object means the service ignored the rubric.
            Some(critique) if critique.overall_score > 0 => critique,
            _ => {
                warn!("critique response was not usable; using citation heuristic");
                Critique::heuristic(draft.citation_mentions())
            }
        },
        Err(failure) => {
            warn!(%failure, "critique call failed; using citation heuristic");
            Critique::heuristic(draft.citation_mentions())
        }
    }
}
