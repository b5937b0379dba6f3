//! Pipeline stage implementations, the rate-limited call gateway, and the
//! sequencer that drives a report run end to end.
//!
//! Every outbound request to the reasoning service flows through one
//! [`CallGateway`], which owns the global pacing slot, the per-attempt
//! timeout, and the bounded retry schedules. The stage modules hold the
//! stage-specific request templates and post-processing; the [`Sequencer`]
//! advances a run through them strictly in order, emits progress events, and
//! maps failures to terminal run states.
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Stages sequence calls between the domain rules in the
//! [`pipeline`] crate and the provider adapter. They contain no domain rules
//! of their own; time and the remote service reach them only through the
//! [`pipeline::Clock`] and [`pipeline::ModelProvider`] ports, which keeps the
//! whole retry/pacing schedule testable without real time passing.

pub mod analyze;
pub mod clock;
pub mod critique;
pub mod draft;
pub mod extract;
pub mod gateway;
pub mod metadata;
pub mod pacer;
pub mod parse;
pub mod progress;
pub mod prompts;
pub mod refine;
pub mod research;
pub mod sequencer;

pub use clock::SystemClock;
pub use gateway::CallGateway;
pub use pacer::Pacer;
pub use sequencer::Sequencer;
