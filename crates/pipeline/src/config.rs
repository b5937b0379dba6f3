//! Static policy configuration.
//!
//! All tunable behaviour — pacing, retry budgets, research thresholds, the
//! credibility table, provider endpoint details, report options — lives here
//! as plain serde types with defaults matching the built-in policy. The CLI
//! loads an optional TOML file over these defaults; nothing is negotiated at
//! runtime.
//!
//! Every section validates itself; [`MonographConfig::validate`] runs before
//! a pipeline is assembled so a run never starts on an invalid policy.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::FixedBackoff;
use crate::credibility::{self, CredibilityTable};
use crate::errors::PipelineError;
use crate::types::CitationStyle;

// ---------------------------------------------------------------------------
// Pacing and retry policy
// ---------------------------------------------------------------------------

/// Pacing and retry policy for the call gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Minimum spacing between the completion of one call and the start of
    /// the next, in seconds.
    pub min_interval_secs: u64,
    /// Ceiling on each individual call attempt, in seconds.
    pub call_timeout_secs: u64,
    /// Maximum attempts per call, including the first.
    pub max_attempts: u32,
    /// Escalating delays applied between attempts after throttling responses.
    pub throttle_backoff_secs: Vec<u64>,
    /// Shorter delays applied between attempts after timeouts and transient
    /// faults.
    pub transient_backoff_secs: Vec<u64>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 5,
            call_timeout_secs: 120,
            max_attempts: 3,
            throttle_backoff_secs: vec![20, 40, 60],
            transient_backoff_secs: vec![5, 10, 15],
        }
    }
}

impl PacingConfig {
    /// Minimum inter-call spacing as a [`Duration`].
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }

    /// Per-attempt ceiling as a [`Duration`].
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Builds the throttling back-off schedule.
    pub fn throttle_backoff(&self) -> Result<FixedBackoff, PipelineError> {
        FixedBackoff::from_secs(&self.throttle_backoff_secs).ok_or_else(|| {
            PipelineError::Configuration {
                message: "throttle back-off schedule must list at least one delay".to_string(),
            }
        })
    }

    /// Builds the transient-fault back-off schedule.
    pub fn transient_backoff(&self) -> Result<FixedBackoff, PipelineError> {
        FixedBackoff::from_secs(&self.transient_backoff_secs).ok_or_else(|| {
            PipelineError::Configuration {
                message: "transient back-off schedule must list at least one delay".to_string(),
            }
        })
    }

    /// Checks the section for values the gateway cannot operate on.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_attempts == 0 {
            return Err(PipelineError::Configuration {
                message: "max_attempts must be at least 1".to_string(),
            });
        }
        if self.call_timeout_secs == 0 {
            return Err(PipelineError::Configuration {
                message: "call_timeout_secs must be at least 1".to_string(),
            });
        }
        self.throttle_backoff()?;
        self.transient_backoff()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Research policy
// ---------------------------------------------------------------------------

/// Thresholds applied during the research and metadata stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchPolicy {
    /// Minimum credible sources required before drafting may start.
    pub min_accepted_sources: usize,
    /// Maximum search queries executed per run.
    pub max_queries: usize,
    /// How many sources the batched title-extraction call covers.
    pub metadata_batch_limit: usize,
    /// Whether unlisted domains may be admitted when the pool would otherwise
    /// fall short of the minimum. Off by default: an unlisted-only pool
    /// aborts the run rather than padding the report with weak sources.
    pub admit_unlisted_when_short: bool,
}

impl Default for ResearchPolicy {
    fn default() -> Self {
        Self {
            min_accepted_sources: 3,
            max_queries: 5,
            metadata_batch_limit: 10,
            admit_unlisted_when_short: false,
        }
    }
}

impl ResearchPolicy {
    /// Checks the section for unusable thresholds.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.min_accepted_sources == 0 {
            return Err(PipelineError::Configuration {
                message: "min_accepted_sources must be at least 1".to_string(),
            });
        }
        if self.max_queries == 0 {
            return Err(PipelineError::Configuration {
                message: "max_queries must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Credibility table
// ---------------------------------------------------------------------------

/// The domain credibility table in configuration form.
///
/// Defaults mirror the built-in table; overriding any part replaces that part
/// wholesale (lists are not merged).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityConfig {
    /// Trusted domain patterns and their scores.
    pub trusted: BTreeMap<String, u8>,
    /// Domain patterns that are never admitted.
    pub rejected: Vec<String>,
    /// Score assigned to domains in neither list.
    pub default_score: u8,
    /// Minimum score for admission to the citation pool.
    pub acceptance_threshold: u8,
}

impl Default for CredibilityConfig {
    fn default() -> Self {
        Self {
            trusted: credibility::TRUSTED
                .iter()
                .map(|(pattern, score)| (pattern.to_string(), *score))
                .collect(),
            rejected: credibility::REJECTED
                .iter()
                .map(|pattern| pattern.to_string())
                .collect(),
            default_score: credibility::DEFAULT_SCORE,
            acceptance_threshold: credibility::ACCEPTANCE_THRESHOLD,
        }
    }
}

impl CredibilityConfig {
    /// Builds the runtime [`CredibilityTable`], validating scores and
    /// patterns.
    pub fn table(&self) -> Result<CredibilityTable, PipelineError> {
        CredibilityTable::new(
            self.trusted
                .iter()
                .map(|(pattern, score)| (pattern.clone(), *score)),
            self.rejected.iter().cloned(),
            self.default_score,
            self.acceptance_threshold,
        )
    }
}

// ---------------------------------------------------------------------------
// Provider endpoint
// ---------------------------------------------------------------------------

/// Remote reasoning-service endpoint details.
///
/// The key itself is never stored in configuration; only the name of the
/// environment variable holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Messages endpoint URL.
    pub api_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            api_url: "https://api.anthropic.com/v1/messages".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Checks the section for empty endpoint details.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for (field, value) in [
            ("provider.model", &self.model),
            ("provider.api_url", &self.api_url),
            ("provider.api_key_env", &self.api_key_env),
        ] {
            if value.trim().is_empty() {
                return Err(PipelineError::Configuration {
                    message: format!("{field} must not be empty"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report options
// ---------------------------------------------------------------------------

/// Options affecting the drafted report and rendered artefact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Reference-list format. A CLI flag may override this per run.
    pub citation_style: CitationStyle,
    /// Maximum sources presented to the drafting prompt.
    pub max_cited_sources: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            citation_style: CitationStyle::Apa,
            max_cited_sources: 12,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// The full configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonographConfig {
    /// Pacing and retry policy.
    pub pacing: PacingConfig,
    /// Research thresholds.
    pub research: ResearchPolicy,
    /// Domain credibility table.
    pub credibility: CredibilityConfig,
    /// Reasoning-service endpoint.
    pub provider: ProviderConfig,
    /// Report options.
    pub report: ReportConfig,
}

impl MonographConfig {
    /// Validates every section. Run once at startup, before the pipeline is
    /// assembled.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.pacing.validate()?;
        self.research.validate()?;
        self.credibility.table()?;
        self.provider.validate()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
