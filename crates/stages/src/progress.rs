//! One-way progress notifications from the sequencer to the presentation
//! layer.
//!
//! Events flow over an unbounded channel so a slow or absent consumer can
//! never stall the pipeline; a dropped receiver turns every send into a
//! no-op.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pipeline::{Clock, ProgressEvent, Stage};
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Emits [`ProgressEvent`]s stamped with time elapsed since the run began.
pub struct ProgressReporter {
    sender: UnboundedSender<ProgressEvent>,
    clock: Arc<dyn Clock>,
    started: Instant,
}

impl ProgressReporter {
    /// Starts the elapsed-time baseline at the current instant.
    pub fn new(sender: UnboundedSender<ProgressEvent>, clock: Arc<dyn Clock>) -> Self {
        let started = clock.now();
        Self {
            sender,
            clock,
            started,
        }
    }

    /// Sends one progress event. Send failures mean the receiver is gone
    /// and are deliberately ignored.
    pub fn emit(&self, stage: Stage, detail: impl Into<String>, percent: u8) {
        let event = ProgressEvent {
            stage,
            detail: detail.into(),
            percent,
            elapsed: self.elapsed(),
        };
        if self.sender.send(event).is_err() {
            trace!("progress receiver dropped; event discarded");
        }
    }

    /// Time elapsed since the reporter was created.
    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_duration_since(self.started)
    }
}
