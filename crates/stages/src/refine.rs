//! Refining: add the executive summary to the finished draft.
//!
//! The summary is the only generated addition at this point; the draft
//! body is carried through unchanged. On call or parse failure the
//! deterministic template summary is used instead.

use pipeline::{RefinedReport, ReportDraft, Stage};
use serde::Deserialize;
use tracing::warn;

use crate::gateway::CallGateway;
use crate::parse::parse_json_payload;
use crate::progress::ProgressReporter;
use crate::prompts;

#[derive(Debug, Deserialize)]
struct SummaryPayload {
    #[serde(rename = "executiveSummary", default)]
    executive_summary: String,
}

/// Produces the refined report, degrading to the template summary when the
/// service cannot.
pub async fn run(
    gateway: &CallGateway,
    reporter: &ProgressReporter,
    topic: &str,
    draft: ReportDraft,
    source_count: usize,
) -> RefinedReport {
    reporter.emit(Stage::Refining, "Final polish...", 92);

    let request = prompts::refine_request(topic, &draft, source_count);
    match gateway.call(&request).await {
        Ok(response) => match parse_json_payload::<SummaryPayload>(&response.text) {
            Some(payload) if !payload.executive_summary.trim().is_empty() => RefinedReport {
                executive_summary: payload.executive_summary,
                draft,
            },
            _ => {
                warn!("refine response carried no summary; using template summary");
                RefinedReport::with_template_summary(draft, topic, source_count)
            }
        },
        Err(failure) => {
            warn!(%failure, "refine call failed; using template summary");
            RefinedReport::with_template_summary(draft, topic, source_count)
        }
    }
}
