//! Report artefact rendering for Monograph.
//!
//! Turns a finished run — the refined report plus its source pool — into the
//! single self-contained HTML document handed back to the requester, with the
//! reference list formatted in the selected citation style.
//!
//! ## Architectural Layer
//!
//! **Presentation.** Pure functions from domain values to strings; no I/O, no
//! remote calls, no clock. Everything here is deterministic and synchronous.

pub mod citation;
pub mod html;

pub use citation::format_citation;
pub use html::render;
