//! Topic analysis: turn the topic into subtopics and search queries.
//!
//! This stage never fails the run. A call failure or unusable response
//! falls back to the deterministic template plan, which is always
//! sufficient to drive the research stage.

use pipeline::{ResearchPlan, Stage};
use tracing::warn;

use crate::gateway::CallGateway;
use crate::parse::parse_json_payload;
use crate::progress::ProgressReporter;
use crate::prompts;

/// Produces the research plan for `topic`, degrading to the template plan
/// when the service cannot.
pub async fn run(
    gateway: &CallGateway,
    reporter: &ProgressReporter,
    topic: &str,
    subject: &str,
) -> ResearchPlan {
    reporter.emit(Stage::AnalyzingTopic, "Creating research plan...", 10);

    let request = prompts::analyze_request(topic, subject);
    match gateway.call(&request).await {
        Ok(response) => match parse_json_payload::<ResearchPlan>(&response.text) {
            Some(mut plan) if plan.is_usable() => {
                plan.topic = topic.to_string();
                plan.subject = subject.to_string();
                plan
            }
            _ => {
                warn!("topic analysis returned an unusable plan; using template");
                ResearchPlan::template(topic, subject)
            }
        },
        Err(failure) => {
            warn!(%failure, "topic analysis call failed; using template plan");
            ResearchPlan::template(topic, subject)
        }
    }
}
