//! Web research: execute the plan's search queries and build the source
//! pool.
//!
//! Each query is one web-search call through the gateway. Returned text is
//! scanned for URLs; every URL is assessed against the credibility table
//! and either enters the pool, is held back as an unlisted candidate, or is
//! recorded as rejected. Duplicates are collapsed on the normalized URL,
//! first occurrence wins.
//!
//! Failure policy: a non-retryable call failure aborts the stage, because
//! the same fault would hit every remaining query. A query whose retries
//! are exhausted is skipped; later queries may still fill the pool. A pool
//! below the minimum after all queries aborts the run.

use std::collections::HashSet;

use chrono::Utc;
use pipeline::{
    CancellationToken, CredibilityTable, PipelineError, RejectedSource, ResearchPolicy,
    RetryPolicy, Source, SourceId, Stage, Verdict,
};
use tracing::{debug, info, warn};

use crate::extract;
use crate::gateway::CallGateway;
use crate::progress::ProgressReporter;
use crate::prompts;

/// The source pool produced by the research stage.
pub struct ResearchOutcome {
    /// Sources admitted to the citation pool, in discovery order.
    pub accepted: Vec<Source>,
    /// Sources excluded from the pool, with the reason each was turned away.
    pub rejected: Vec<RejectedSource>,
}

/// Runs every query in the plan and assembles the source pool.
pub async fn run(
    gateway: &CallGateway,
    table: &CredibilityTable,
    policy: &ResearchPolicy,
    cancel: &CancellationToken,
    reporter: &ProgressReporter,
    queries: &[String],
) -> Result<ResearchOutcome, PipelineError> {
    reporter.emit(Stage::Researching, "Searching...", 25);

    let limit = queries.len().min(policy.max_queries);
    let queries = &queries[..limit];

    let mut accepted: Vec<Source> = Vec::new();
    let mut unlisted: Vec<Source> = Vec::new();
    let mut rejected: Vec<RejectedSource> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, query) in queries.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled {
                stage: Stage::Researching,
            });
        }

        let percent = 25 + ((index * 30) / queries.len()) as u8;
        reporter.emit(
            Stage::Researching,
            format!(
                "Query {}/{}: {}...",
                index + 1,
                queries.len(),
                extract::truncate_chars(query, 40)
            ),
            percent,
        );

        let text = match gateway.call(&prompts::search_request(query)).await {
            Ok(response) => response.text,
            Err(failure) => match failure.error.retry_policy() {
                RetryPolicy::NonRetryable => {
                    return Err(PipelineError::StageFailed {
                        stage: Stage::Researching,
                        failure,
                    });
                }
                RetryPolicy::Retryable { .. } => {
                    warn!(%query, %failure, "search query failed; continuing with the rest");
                    continue;
                }
            },
        };

        for url in extract::find_urls(&text) {
            let Some(domain) = extract::domain_of(&url) else {
                rejected.push(RejectedSource {
                    url,
                    query: query.clone(),
                    reason: "Invalid URL".to_string(),
                });
                continue;
            };

            let assessment = table.assess(&domain);
            if assessment.verdict == Verdict::Rejected {
                rejected.push(RejectedSource {
                    url,
                    query: query.clone(),
                    reason: assessment.justification,
                });
                continue;
            }

            if !seen.insert(extract::normalize_url(&url)) {
                continue;
            }

            let context = extract::context_window(&text, &url);
            let metadata = extract::extract_from_url_pattern(&url);
            let source = Source {
                id: SourceId::new_random(),
                domain,
                credibility: assessment.score,
                accepted: assessment.accepted,
                justification: assessment.justification,
                query: query.clone(),
                context: extract::truncate_chars(context.trim(), 800).to_string(),
                date_accessed: Utc::now(),
                metadata,
                url,
            };
            if source.accepted {
                accepted.push(source);
            } else {
                unlisted.push(source);
            }
        }

        debug!(
            %query,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "query processed"
        );
    }

    // Unlisted candidates only enter the pool under explicit policy, and
    // only up to the minimum.
    if policy.admit_unlisted_when_short && accepted.len() < policy.min_accepted_sources {
        let shortfall = policy.min_accepted_sources - accepted.len();
        for mut source in unlisted.drain(..shortfall.min(unlisted.len())) {
            warn!(url = %source.url, "admitting unlisted source to reach the minimum pool");
            source.accepted = true;
            accepted.push(source);
        }
    }
    for source in unlisted {
        rejected.push(RejectedSource {
            url: source.url,
            query: source.query,
            reason: source.justification,
        });
    }

    info!(
        accepted = accepted.len(),
        rejected = rejected.len(),
        "research finished"
    );

    if accepted.len() < policy.min_accepted_sources {
        return Err(PipelineError::InsufficientSources {
            accepted: accepted.len(),
            required: policy.min_accepted_sources,
        });
    }

    Ok(ResearchOutcome { accepted, rejected })
}
