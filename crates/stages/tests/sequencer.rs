//! End-to-end sequencer behaviour with a scripted provider: stage ordering,
//! credibility filtering, degradation paths, abort conditions, and
//! cancellation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pipeline::{
    CallError, CancellationToken, Clock, CredibilityScore, Critique, DomainName, FatalKind,
    ModelProvider, MonographConfig, PacingConfig, PipelineError, ProgressEvent, ResearchPolicy,
    Source, SourceId, SourceMetadata, Stage,
};
use stages::progress::ProgressReporter;
use stages::{metadata, CallGateway, Sequencer};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use common::{run_request, FakeClock, StubCall, StubProvider};

const PLAN: &str =
    r#"{"subtopics": ["Control systems"], "researchQueries": ["robot control papers"]}"#;

// One trusted .edu, one rejected aggregator, one preprint, one agency page.
const SEARCH_MIXED: &str = "Results: https://web.mit.edu/a Ok. \
     More: https://medium.com/b Ok. \
     Next: https://arxiv.org/abs/2301.04567 Ok. \
     Last: https://example.gov/r End.";

// A labelled title in context, so no extraction call is needed.
const SEARCH_TITLED: &str = "Title: Adaptive Control For Legged Robots In The Wild\n\
     See https://web.mit.edu/a and https://arxiv.org/abs/2301.04567 \
     and https://example.gov/r now.";

const BATCH: &str = r#"{"sources": [
        {"index": 1, "title": "Distributed Robot Learning At Campus Scale", "authors": "Lee and Park", "year": "2023"},
        {"index": 2, "title": "Sample Efficient Policy Gradients For Control", "authors": "Nguyen et al.", "year": "2022"},
        {"index": 3, "title": "Federal Robotics Assessment Report Overview", "authors": "Agency Staff", "year": "2021"}
    ]}"#;

const DRAFT: &str = r#"{"abstract": "Robotic control advanced rapidly [Source 1].",
     "introduction": "Intro [Source 2].", "literatureReview": "Review [Source 3].",
     "mainSections": [{"title": "Methods", "content": "Content [Source 1]."}],
     "dataAnalysis": "Data points.", "challenges": "Open challenges.",
     "futureOutlook": "Outlook ahead.", "conclusion": "Closing remarks."}"#;

const CRITIQUE: &str = r#"{"topicRelevance": 88, "citationQuality": 77,
     "overallScore": 84, "recommendations": ["Add more recent sources"]}"#;

const REFINE: &str =
    r#"{"executiveSummary": "Robot control research is advancing quickly across laboratories."}"#;

fn sequencer(
    config: &MonographConfig,
    provider: Arc<StubProvider>,
    clock: Arc<FakeClock>,
    cancel: CancellationToken,
) -> (Sequencer, UnboundedReceiver<ProgressEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let sequencer = Sequencer::new(config, provider, clock, sender, cancel).unwrap();
    (sequencer, receiver)
}

fn drain(receiver: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn full_run_filters_sources_and_assembles_the_report() {
    let provider = StubProvider::new(vec![
        StubCall::Ok(PLAN),
        StubCall::Ok(SEARCH_MIXED),
        StubCall::Ok(BATCH),
        StubCall::Ok(DRAFT),
        StubCall::Ok(CRITIQUE),
        StubCall::Ok(REFINE),
    ]);
    let clock = FakeClock::new();
    let (sequencer, mut receiver) = sequencer(
        &MonographConfig::default(),
        Arc::clone(&provider),
        Arc::clone(&clock),
        CancellationToken::new(),
    );

    let completed = sequencer.run(run_request("robot control")).await.unwrap();

    // Exactly the minimum pool size is enough to proceed.
    assert_eq!(completed.sources.len(), 3);
    assert_eq!(completed.rejected.len(), 1);
    assert_eq!(completed.rejected[0].url, "https://medium.com/b");
    assert_eq!(completed.rejected[0].reason, "Rejected: medium.com");

    let scores: Vec<u8> = completed
        .sources
        .iter()
        .map(|source| source.credibility.as_u8())
        .collect();
    assert_eq!(scores, vec![95, 90, 95]);

    // Batched extraction replaced the URL-derived titles.
    assert_eq!(
        completed.sources[0].metadata.title.as_deref(),
        Some("Distributed Robot Learning At Campus Scale")
    );
    assert_eq!(completed.sources[1].metadata.year.as_deref(), Some("2022"));

    assert_eq!(completed.critique.overall_score, 84);
    assert_eq!(
        completed.report.executive_summary,
        "Robot control research is advancing quickly across laboratories."
    );

    // The artefact carries the report and the references, not the rejects.
    assert!(completed.html.contains("Robotic control advanced rapidly"));
    assert!(completed
        .html
        .contains("Distributed Robot Learning At Campus Scale"));
    assert!(completed.html.contains("https://web.mit.edu/a"));
    assert!(!completed.html.contains("medium.com"));

    assert_eq!(completed.stats.api_calls, 6);
    assert_eq!(completed.stats.accepted_sources, 3);
    assert_eq!(completed.stats.rejected_sources, 1);
    // Six paced calls, five waits of the minimum interval, no retries.
    assert_eq!(completed.stats.elapsed, Duration::from_secs(25));

    let requests = provider.requests();
    assert_eq!(requests.len(), 6);
    assert!(requests[1].web_search);
    assert!(requests.iter().enumerate().all(|(i, r)| i == 1 || !r.web_search));
    // Drafting saw the extracted titles, numbered for citation.
    assert!(requests[3]
        .prompt
        .contains("[1] Distributed Robot Learning At Campus Scale (2023)"));

    let events = drain(&mut receiver);
    assert_eq!(events.first().map(|e| (e.stage, e.percent)), Some((Stage::AnalyzingTopic, 10)));
    assert_eq!(events.last().map(|e| (e.stage, e.percent)), Some((Stage::Done, 100)));
    assert!(events.windows(2).all(|pair| pair[0].percent <= pair[1].percent));
}

#[tokio::test]
async fn too_few_credible_sources_abort_before_drafting() {
    let provider = StubProvider::new(vec![
        StubCall::Ok(PLAN),
        StubCall::Ok(
            "Notes: https://medium.com/x Ok. Also https://randomblog.example/post End.",
        ),
    ]);
    let clock = FakeClock::new();
    let (sequencer, _receiver) = sequencer(
        &MonographConfig::default(),
        Arc::clone(&provider),
        clock,
        CancellationToken::new(),
    );

    let error = sequencer
        .run(run_request("robot control"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PipelineError::InsufficientSources {
            accepted: 0,
            required: 3,
        }
    ));
    assert!(error.user_hint().unwrap().contains("broadening"));
    // Analyze and one search; no metadata or drafting calls were made.
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn fatal_search_failure_aborts_the_stage_without_retries() {
    let provider = StubProvider::new(vec![
        StubCall::Ok(PLAN),
        StubCall::Err(CallError::Fatal {
            kind: FatalKind::MalformedRequest,
            message: "prompt rejected".to_string(),
        }),
    ]);
    let clock = FakeClock::new();
    let (sequencer, _receiver) = sequencer(
        &MonographConfig::default(),
        Arc::clone(&provider),
        clock,
        CancellationToken::new(),
    );

    let error = sequencer
        .run(run_request("robot control"))
        .await
        .unwrap_err();

    match error {
        PipelineError::StageFailed { stage, failure } => {
            assert_eq!(stage, Stage::Researching);
            assert!(matches!(failure.error, CallError::Fatal { .. }));
            assert_eq!(failure.attempts, 1);
        }
        other => panic!("expected StageFailed, got {other:?}"),
    }
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn cancellation_mid_research_ends_in_cancelled_not_failed() {
    let plan_two_queries =
        r#"{"subtopics": ["A"], "researchQueries": ["first query", "second query"]}"#;
    let provider = StubProvider::new(vec![
        StubCall::Ok(plan_two_queries),
        StubCall::Ok(SEARCH_TITLED),
    ]);
    let clock = FakeClock::new();
    let token = CancellationToken::new();
    // The token trips as a side effect of the first search call, so the
    // second query is never dispatched.
    provider.cancel_after(2, token.clone());
    let (sequencer, _receiver) = sequencer(
        &MonographConfig::default(),
        Arc::clone(&provider),
        clock,
        token,
    );

    let error = sequencer
        .run(run_request("robot control"))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PipelineError::Cancelled {
            stage: Stage::Researching,
        }
    ));
    assert_eq!(provider.requests().len(), 2);
}

#[tokio::test]
async fn cancellation_before_the_extraction_call_skips_it() {
    // Cancellation can land during the metadata stage's local phase; the
    // batched extraction call must then be skipped, not dispatched.
    let provider = StubProvider::new(vec![]);
    let clock = FakeClock::new();
    let gateway = CallGateway::new(
        Arc::clone(&provider) as Arc<dyn ModelProvider>,
        Arc::clone(&clock) as Arc<dyn Clock>,
        &PacingConfig::default(),
    )
    .unwrap();
    let (sender, _receiver) = mpsc::unbounded_channel();
    let reporter = ProgressReporter::new(sender, Arc::clone(&clock) as Arc<dyn Clock>);
    let token = CancellationToken::new();
    token.cancel();

    // The context yields no local title, so an extraction call would
    // normally follow.
    let mut sources = vec![Source {
        id: SourceId::new_random(),
        url: "https://web.mit.edu/a".to_string(),
        domain: DomainName::new("web.mit.edu").unwrap(),
        credibility: CredibilityScore::clamped(95),
        accepted: true,
        justification: "Trusted: .edu".to_string(),
        query: "robot control papers".to_string(),
        context: "ref 1.".to_string(),
        date_accessed: Utc::now(),
        metadata: SourceMetadata {
            title: Some("MIT Research Article".to_string()),
            ..SourceMetadata::default()
        },
    }];
    metadata::run(
        &gateway,
        &ResearchPolicy::default(),
        &token,
        &reporter,
        &mut sources,
    )
    .await;

    assert!(provider.requests().is_empty());
    assert_eq!(
        sources[0].metadata.title.as_deref(),
        Some("MIT Research Article")
    );
}

#[tokio::test]
async fn degraded_services_still_produce_a_report() {
    // Analysis, critique, and refinement all fail fatally; the run leans on
    // the template plan, the citation heuristic, and the template summary.
    let draft_two_mentions = r#"{"abstract": "Study [Source 1] and [Source 2].",
         "introduction": "I.", "literatureReview": "L.", "mainSections": [],
         "dataAnalysis": "D.", "challenges": "C.", "futureOutlook": "F.",
         "conclusion": "End."}"#;
    let fatal = || {
        StubCall::Err(CallError::Fatal {
            kind: FatalKind::ContentPolicy,
            message: "refused".to_string(),
        })
    };
    let provider = StubProvider::new(vec![
        fatal(),
        StubCall::Ok(SEARCH_TITLED),
        StubCall::Ok(draft_two_mentions),
        fatal(),
        fatal(),
    ]);
    let clock = FakeClock::new();
    let mut config = MonographConfig::default();
    config.research.max_queries = 1;
    let (sequencer, _receiver) = sequencer(
        &config,
        Arc::clone(&provider),
        clock,
        CancellationToken::new(),
    );

    let completed = sequencer.run(run_request("robotics")).await.unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 5);
    // The template plan supplied the query wording.
    assert!(requests[1].prompt.contains("Search: robotics research 2024"));
    // Context titles made the extraction call unnecessary.
    assert_eq!(
        completed.sources[0].metadata.title.as_deref(),
        Some("Adaptive Control For Legged Robots In The Wild")
    );

    assert_eq!(completed.critique, Critique::heuristic(2));
    assert_eq!(completed.critique.citation_quality, 64);
    assert_eq!(
        completed.report.executive_summary,
        "This comprehensive report examines robotics, analyzing key developments, \
         challenges, and future directions based on 3 authoritative academic sources."
    );
    // Empty main sections were filled with placeholders.
    assert!(completed.html.contains("<h2>Analysis</h2>"));
}

#[tokio::test]
async fn unusable_draft_json_degrades_to_placeholder_sections() {
    let provider = StubProvider::new(vec![
        StubCall::Ok(PLAN),
        StubCall::Ok(SEARCH_TITLED),
        StubCall::Ok("The model refuses to answer in JSON this time."),
        StubCall::Ok(CRITIQUE),
        StubCall::Ok(REFINE),
    ]);
    let clock = FakeClock::new();
    let (sequencer, _receiver) = sequencer(
        &MonographConfig::default(),
        Arc::clone(&provider),
        clock,
        CancellationToken::new(),
    );

    let completed = sequencer.run(run_request("robot control")).await.unwrap();

    assert_eq!(completed.report.draft.abstract_text, "Section.");
    assert_eq!(completed.report.draft.main_sections.len(), 1);
    assert_eq!(completed.report.draft.main_sections[0].title, "Analysis");
    assert!(completed.html.contains("<p>Section.</p>"));
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_any_call() {
    let provider = StubProvider::new(vec![]);
    let clock = FakeClock::new();
    let (sequencer, _receiver) = sequencer(
        &MonographConfig::default(),
        Arc::clone(&provider),
        clock,
        CancellationToken::new(),
    );

    let mut request = run_request("robot control");
    request.topic = "  ".to_string();
    let error = sequencer.run(request).await.unwrap_err();

    assert!(matches!(error, PipelineError::InvalidRequest { .. }));
    assert!(provider.requests().is_empty());
}
