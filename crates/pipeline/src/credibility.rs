//! Domain credibility policy.
//!
//! Source filtering is a static domain-pattern table, not a remote judgement:
//! a fixed list of trusted academic patterns with per-pattern scores, a fixed
//! list of rejected content-farm domains, and a default low score for
//! everything else. Rejection always wins — a domain matching both lists is
//! rejected.
//!
//! Pattern semantics: entries starting with `.` are TLD-style suffixes
//! (`".edu"` matches `mit.edu` and `web.mit.edu`); other entries match the
//! host exactly or as the registrable parent of a subdomain (`"nature.com"`
//! matches `www.nature.com`).

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::identifiers::DomainName;
use crate::types::CredibilityScore;

// ---------------------------------------------------------------------------
// Built-in policy
// ---------------------------------------------------------------------------

/// Trusted patterns and their scores. University and government hosts sit at
/// the top; established publishers slightly below.
pub(crate) const TRUSTED: &[(&str, u8)] = &[
    (".edu", 95),
    (".gov", 95),
    ("nature.com", 95),
    ("science.org", 95),
    ("ieee.org", 95),
    ("acm.org", 95),
    ("pnas.org", 95),
    ("springer.com", 90),
    ("arxiv.org", 90),
    ("sciencedirect.com", 85),
    ("wiley.com", 85),
];

/// Domains that never enter the citation pool, regardless of content.
pub(crate) const REJECTED: &[&str] = &[
    "researchgate.net",
    "academia.edu",
    "scribd.com",
    "medium.com",
];

/// Score assigned to domains in neither list.
pub(crate) const DEFAULT_SCORE: u8 = 40;

/// Minimum score for admission to the citation pool.
pub(crate) const ACCEPTANCE_THRESHOLD: u8 = 60;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Which part of the table matched a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Matched a trusted pattern.
    Trusted,
    /// Matched a rejection pattern.
    Rejected,
    /// Matched neither list.
    Unlisted,
}

/// The outcome of scoring one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Assigned credibility score.
    pub score: CredibilityScore,
    /// Which part of the table matched.
    pub verdict: Verdict,
    /// Whether the source enters the citation pool.
    pub accepted: bool,
    /// Human-readable account of the verdict, kept in the audit trail.
    pub justification: String,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// The credibility table: an ordered trusted list, a rejection list, and the
/// defaults applied to everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct CredibilityTable {
    trusted: Vec<(String, CredibilityScore)>,
    rejected: Vec<String>,
    default_score: CredibilityScore,
    threshold: CredibilityScore,
}

impl CredibilityTable {
    /// Builds a table from explicit entries.
    ///
    /// Fails if any pattern is empty or any score exceeds 100.
    pub fn new(
        trusted: impl IntoIterator<Item = (String, u8)>,
        rejected: impl IntoIterator<Item = String>,
        default_score: u8,
        threshold: u8,
    ) -> Result<Self, PipelineError> {
        let mut trusted_entries = Vec::new();
        for (pattern, raw_score) in trusted {
            let pattern = pattern.trim().to_ascii_lowercase();
            if pattern.is_empty() {
                return Err(PipelineError::Configuration {
                    message: "trusted domain pattern must not be empty".to_string(),
                });
            }
            let score = CredibilityScore::new(raw_score).ok_or_else(|| {
                PipelineError::Configuration {
                    message: format!(
                        "credibility score {raw_score} for '{pattern}' exceeds 100"
                    ),
                }
            })?;
            trusted_entries.push((pattern, score));
        }

        let mut rejected_entries = Vec::new();
        for pattern in rejected {
            let pattern = pattern.trim().to_ascii_lowercase();
            if pattern.is_empty() {
                return Err(PipelineError::Configuration {
                    message: "rejected domain pattern must not be empty".to_string(),
                });
            }
            rejected_entries.push(pattern);
        }

        let default_score = CredibilityScore::new(default_score).ok_or_else(|| {
            PipelineError::Configuration {
                message: format!("default credibility score {default_score} exceeds 100"),
            }
        })?;
        let threshold = CredibilityScore::new(threshold).ok_or_else(|| {
            PipelineError::Configuration {
                message: format!("acceptance threshold {threshold} exceeds 100"),
            }
        })?;

        Ok(Self {
            trusted: trusted_entries,
            rejected: rejected_entries,
            default_score,
            threshold,
        })
    }

    /// Scores a domain. Rejection patterns are checked before trusted
    /// patterns, so an overlap (e.g. `academia.edu` under a trusted `.edu`)
    /// always rejects.
    pub fn assess(&self, domain: &DomainName) -> Assessment {
        let host = domain.as_str();

        for pattern in &self.rejected {
            if pattern_matches(pattern, host) {
                return Assessment {
                    score: CredibilityScore::clamped(0),
                    verdict: Verdict::Rejected,
                    accepted: false,
                    justification: format!("Rejected: {pattern}"),
                };
            }
        }

        for (pattern, score) in &self.trusted {
            if pattern_matches(pattern, host) {
                return Assessment {
                    score: *score,
                    verdict: Verdict::Trusted,
                    accepted: *score >= self.threshold,
                    justification: format!("Trusted: {pattern}"),
                };
            }
        }

        Assessment {
            score: self.default_score,
            verdict: Verdict::Unlisted,
            accepted: false,
            justification: "Not in trusted list".to_string(),
        }
    }

    /// The configured acceptance threshold.
    pub fn threshold(&self) -> CredibilityScore {
        self.threshold
    }
}

impl Default for CredibilityTable {
    fn default() -> Self {
        Self {
            trusted: TRUSTED
                .iter()
                .map(|(pattern, score)| (pattern.to_string(), CredibilityScore::clamped(*score)))
                .collect(),
            rejected: REJECTED.iter().map(|pattern| pattern.to_string()).collect(),
            default_score: CredibilityScore::clamped(DEFAULT_SCORE),
            threshold: CredibilityScore::clamped(ACCEPTANCE_THRESHOLD),
        }
    }
}

/// Matches `pattern` against `host`.
///
/// `.suffix` patterns match any host ending in the suffix; bare-domain
/// patterns match the host itself or any subdomain of it.
fn pattern_matches(pattern: &str, host: &str) -> bool {
    if let Some(stripped) = pattern.strip_prefix('.') {
        host.ends_with(pattern) || host == stripped
    } else {
        host == pattern || host.ends_with(&format!(".{pattern}"))
    }
}

// ---------------------------------------------------------------------------
