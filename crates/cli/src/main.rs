//! Monograph CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Parse configuration** — load an optional `monograph.toml` over the
//!    built-in defaults; [`Sequencer::new`] validates it before anything runs.
//! 2. **Wire observability** — install `tracing-subscriber` with an
//!    env-filtered fmt layer writing to stderr. All `tracing` events emitted
//!    by every crate in the workspace flow through it.
//! 3. **Construct infrastructure** — build the [`AnthropicProvider`], the
//!    system clock, the progress channel, and the Ctrl-C cancellation token,
//!    and inject them into the [`Sequencer`].
//! 4. **Run one report** — drive the pipeline once for the requested topic,
//!    write the HTML artefact, and print the run summary.
//!
//! Stdout carries the artefact alone (and only with `--output -`); progress
//! lines, the summary, and all diagnostics go to stderr, so the output stays
//! pipeable.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use llm::AnthropicProvider;
use pipeline::{
    CancellationToken, CitationStyle, CompletedRun, MonographConfig, ProgressEvent, RunRequest,
};
use stages::{Sequencer, SystemClock};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, warn};

/// Generates a sourced research report on one topic.
#[derive(Parser, Debug)]
#[command(name = "monograph", version, about, long_about = None)]
struct Args {
    /// Field of study the report covers (e.g. "Quantum Computing").
    topic: String,

    /// Academic subject the report belongs to (e.g. "Computer Science").
    #[arg(long)]
    subject: String,

    /// Researcher name printed on the cover page.
    #[arg(long)]
    researcher: String,

    /// Institution printed on the cover page.
    #[arg(long)]
    institution: String,

    /// Report date (YYYY-MM-DD); today when omitted.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Citation style, `apa` or `ieee`; the configured default when omitted.
    #[arg(long)]
    style: Option<CitationStyle>,

    /// Configuration file; built-in defaults apply when the file is absent.
    #[arg(long, default_value = "monograph.toml")]
    config: PathBuf,

    /// Where to write the HTML report: a path, or `-` for stdout. Derived
    /// from the topic when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args.config)?;

    let provider = AnthropicProvider::from_env(&config.provider)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let (sender, receiver) = mpsc::unbounded_channel();
    let renderer = tokio::spawn(render_progress(receiver));

    let sequencer = Sequencer::new(
        &config,
        Arc::new(provider),
        Arc::new(SystemClock),
        sender,
        cancel,
    )?;

    let output = args
        .output
        .unwrap_or_else(|| default_output(&args.topic));
    let request = RunRequest {
        topic: args.topic,
        subject: args.subject,
        researcher: args.researcher,
        institution: args.institution,
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
        citation_style: args.style.unwrap_or(config.report.citation_style),
    };

    let outcome = sequencer.run(request).await;
    // The sequencer holds the last sender; dropping it closes the channel so
    // the renderer drains and exits before the summary prints.
    drop(sequencer);
    let _ = renderer.await;

    match outcome {
        Ok(run) => {
            write_artifact(&output, &run)?;
            print_summary(&run);
            Ok(())
        }
        Err(error) => {
            if let Some(hint) = error.user_hint() {
                eprintln!("hint: {hint}");
            }
            Err(error.into())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<MonographConfig> {
    if !path.exists() {
        info!(path = %path.display(), "no configuration file; using built-in defaults");
        return Ok(MonographConfig::default());
    }
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config =
        toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested; stopping at the next stage boundary");
            cancel.cancel();
        }
    });
}

async fn render_progress(mut receiver: UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = receiver.recv().await {
        eprintln!(
            "[{:>3}%] {}: {}",
            event.percent,
            event.stage.label(),
            event.detail
        );
    }
}

fn default_output(topic: &str) -> PathBuf {
    PathBuf::from(format!("{}_Report.html", topic.replace(' ', "_")))
}

fn write_artifact(output: &Path, run: &CompletedRun) -> anyhow::Result<()> {
    if output == Path::new("-") {
        print!("{}", run.html);
        return Ok(());
    }
    std::fs::write(output, &run.html)
        .with_context(|| format!("writing report to {}", output.display()))?;
    eprintln!("Report written to {}", output.display());
    Ok(())
}

fn print_summary(run: &CompletedRun) {
    let stats = &run.stats;
    let elapsed = stats.elapsed.as_secs();
    eprintln!(
        "Completed in {}m {}s: {} API calls, {} sources cited, {} rejected.",
        elapsed / 60,
        elapsed % 60,
        stats.api_calls,
        stats.accepted_sources,
        stats.rejected_sources,
    );
    if !run.sources.is_empty() {
        let total: u32 = run
            .sources
            .iter()
            .map(|source| u32::from(source.credibility.as_u8()))
            .sum();
        eprintln!(
            "Average source credibility: {}%",
            total / run.sources.len() as u32
        );
    }
}
