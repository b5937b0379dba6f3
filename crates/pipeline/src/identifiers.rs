//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging —
//! for example — a [`RunId`] with a [`SourceId`] even though both are UUIDs
//! under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single pipeline execution run (one report request end to end).
///
/// Generated fresh for every run; propagated through spans and progress events
/// so all activity from a single run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`RunId`] from an existing UUID (e.g. deserialised from state).
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a discovered source within a run.
///
/// Assigned when a search hit is first recorded, before the credibility
/// verdict; rejected sources keep their identifier in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(Uuid);

impl SourceId {
    /// Generates a new random source identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`SourceId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (network names)
// ---------------------------------------------------------------------------

/// A registrable host name extracted from a source URL (e.g. `"arxiv.org"`,
/// `"web.mit.edu"`).
///
/// Stored lowercased so credibility matching is case-insensitive. The value is
/// the full host; pattern matching against the credibility table is the
/// responsibility of [`crate::credibility::CredibilityTable`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainName(String);

impl DomainName {
    /// Creates a new domain name, returning `None` if the value is empty or
    /// contains characters that can never appear in a host.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into().trim().to_ascii_lowercase();
        if v.is_empty() || v.contains('/') || v.contains(char::is_whitespace) {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the domain as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DomainName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
