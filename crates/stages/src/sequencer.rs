//! The pipeline sequencer: strict stage ordering, failure propagation, and
//! progress reporting for one report run.
//!
//! Stages advance in a fixed order; each stage's output is a precondition
//! for the next, so nothing runs in parallel across stages. The sequencer
//! owns the failure policy boundaries: which stages degrade locally, which
//! abort the run, and where cancellation is observed. All remote traffic
//! funnels through the single [`CallGateway`], so pacing and retry
//! guarantees hold across every stage.

use std::sync::Arc;

use pipeline::{
    CancellationToken, Clock, CompletedRun, CredibilityTable, ModelProvider, MonographConfig,
    PipelineError, PipelineRun, ProgressEvent, ReportConfig, ResearchPolicy, RunRequest, RunStats,
    Stage,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::gateway::CallGateway;
use crate::progress::ProgressReporter;
use crate::{analyze, critique, draft, metadata, refine, research};

/// Drives one report run through every stage.
pub struct Sequencer {
    gateway: CallGateway,
    credibility: CredibilityTable,
    research: ResearchPolicy,
    report: ReportConfig,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    progress: UnboundedSender<ProgressEvent>,
}

impl Sequencer {
    /// Builds a sequencer from validated configuration.
    pub fn new(
        config: &MonographConfig,
        provider: Arc<dyn ModelProvider>,
        clock: Arc<dyn Clock>,
        progress: UnboundedSender<ProgressEvent>,
        cancel: CancellationToken,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            gateway: CallGateway::new(provider, Arc::clone(&clock), &config.pacing)?,
            credibility: config.credibility.table()?,
            research: config.research.clone(),
            report: config.report.clone(),
            clock,
            cancel,
            progress,
        })
    }

    /// Executes the run to completion, cancellation, or failure.
    pub async fn run(&self, request: RunRequest) -> Result<CompletedRun, PipelineError> {
        request.validate()?;
        let reporter = ProgressReporter::new(self.progress.clone(), Arc::clone(&self.clock));
        let mut run = PipelineRun::new(request);
        info!(run_id = %run.id, topic = %run.request.topic, "pipeline run started");

        self.enter(&mut run, Stage::AnalyzingTopic)?;
        let plan = analyze::run(
            &self.gateway,
            &reporter,
            &run.request.topic,
            &run.request.subject,
        )
        .await;

        self.enter(&mut run, Stage::Researching)?;
        let outcome = research::run(
            &self.gateway,
            &self.credibility,
            &self.research,
            &self.cancel,
            &reporter,
            &plan.queries,
        )
        .await?;
        run.sources = outcome.accepted;
        run.rejected = outcome.rejected;

        self.enter(&mut run, Stage::ExtractingMetadata)?;
        metadata::run(
            &self.gateway,
            &self.research,
            &self.cancel,
            &reporter,
            &mut run.sources,
        )
        .await;

        self.enter(&mut run, Stage::Drafting)?;
        let body = draft::run(
            &self.gateway,
            &reporter,
            &run.request.topic,
            &run.request.subject,
            &plan.subtopics,
            &run.sources,
            self.report.max_cited_sources,
        )
        .await?;
        run.plan = Some(plan);

        self.enter(&mut run, Stage::Critiquing)?;
        let scores = critique::run(&self.gateway, &reporter, &run.request.topic, &body).await;

        self.enter(&mut run, Stage::Refining)?;
        let refined = refine::run(
            &self.gateway,
            &reporter,
            &run.request.topic,
            body,
            run.sources.len(),
        )
        .await;

        self.enter(&mut run, Stage::Exporting)?;
        reporter.emit(Stage::Exporting, "Creating document...", 97);
        let html = report::render(&run.request, &refined, &run.sources);

        run.stage = Stage::Done;
        run.draft = Some(refined.draft.clone());
        run.critique = Some(scores.clone());
        run.report = Some(refined.clone());
        reporter.emit(Stage::Done, "Report generated successfully!", 100);

        let stats = RunStats {
            api_calls: self.gateway.attempts_made(),
            elapsed: reporter.elapsed(),
            accepted_sources: run.sources.len(),
            rejected_sources: run.rejected.len(),
        };
        info!(
            run_id = %run.id,
            api_calls = stats.api_calls,
            elapsed_secs = stats.elapsed.as_secs(),
            sources = stats.accepted_sources,
            "pipeline run complete"
        );

        Ok(CompletedRun {
            id: run.id,
            request: run.request,
            report: refined,
            critique: scores,
            sources: run.sources,
            rejected: run.rejected,
            html,
            stats,
        })
    }

    /// Advances to `stage` unless cancellation has been observed.
    fn enter(&self, run: &mut PipelineRun, stage: Stage) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled { stage });
        }
        run.stage = stage;
        Ok(())
    }
}
