//! Core report-pipeline domain for Monograph.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, policy table, and cross-cutting error type used throughout the
//! pipeline. Infrastructure crates implement the port traits defined here;
//! they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply
//! it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`RunId`, `SourceId`, `DomainName`) |
//! | [`types`] | Shared value types (`Source`, `ResearchPlan`, `ReportDraft`, `Stage`, …) |
//! | [`errors`] | Call-level and run-level error taxonomy plus [`RetryPolicy`] |
//! | [`backoff`] | The [`Backoff`] schedule abstraction and its fixed-table impl |
//! | [`credibility`] | Domain credibility table: trusted / rejected / unlisted verdicts |
//! | [`provider`] | Port traits for the remote reasoning service and the clock |
//! | [`cancel`] | Cooperative cancellation token checked between stages |
//! | [`config`] | Static policy configuration with validated defaults |

pub mod backoff;
pub mod cancel;
pub mod config;
pub mod credibility;
pub mod errors;
pub mod identifiers;
pub mod provider;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use backoff::{Backoff, FixedBackoff};
pub use cancel::CancellationToken;
pub use config::{
    CredibilityConfig, MonographConfig, PacingConfig, ProviderConfig, ReportConfig,
    ResearchPolicy,
};
pub use credibility::{Assessment, CredibilityTable, Verdict};
pub use errors::{CallError, CallFailure, FatalKind, PipelineError, RetryPolicy};
pub use identifiers::{DomainName, RunId, SourceId};
pub use provider::{Clock, GenerationRequest, GenerationResponse, ModelProvider};
pub use types::{
    CitationStyle, CompletedRun, CredibilityScore, Critique, DraftSection, PipelineRun,
    ProgressEvent, RefinedReport, RejectedSource, ReportDraft, ResearchPlan, RunRequest,
    RunStats, Source, SourceMetadata, Stage,
};
