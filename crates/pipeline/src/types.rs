//! Shared value types for the Monograph report pipeline.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! meaningful values with invariants (e.g. credibility scores are in
//! `[0, 100]`, a research plan must list at least one query to be usable) and
//! participate in domain computations.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::identifiers::{DomainName, RunId, SourceId};

// ---------------------------------------------------------------------------
// Score types
// ---------------------------------------------------------------------------

/// A source credibility score in the range `[0, 100]`.
///
/// Assigned by the domain credibility table and compared against the
/// acceptance threshold to decide whether a discovered source enters the
/// citation pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CredibilityScore(u8);

impl CredibilityScore {
    /// The maximum representable score.
    pub const MAX: u8 = 100;

    /// Creates a [`CredibilityScore`], returning `None` if `value` exceeds 100.
    #[must_use]
    pub fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Creates a [`CredibilityScore`], capping `value` at 100.
    pub fn clamped(value: u8) -> Self {
        Self(value.min(Self::MAX))
    }

    /// Returns the score as a `u8` in `[0, 100]`.
    pub fn as_u8(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for CredibilityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Citation styles
// ---------------------------------------------------------------------------

/// Reference-list citation format selected by the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    /// American Psychological Association author–date style.
    Apa,
    /// IEEE numbered bracket style.
    Ieee,
}

impl CitationStyle {
    /// Returns the conventional display name (`"APA"` / `"IEEE"`).
    pub fn label(self) -> &'static str {
        match self {
            Self::Apa => "APA",
            Self::Ieee => "IEEE",
        }
    }
}

impl std::fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CitationStyle {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apa" => Ok(Self::Apa),
            "ieee" => Ok(Self::Ieee),
            other => Err(PipelineError::InvalidRequest {
                message: format!("unknown citation style '{other}' (expected 'apa' or 'ieee')"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// The phases a report run moves through, in order.
///
/// The sequencer advances through these strictly in sequence; a run never
/// revisits an earlier stage. [`Stage::Idle`] is the pre-start state and
/// [`Stage::Done`] the successful terminal; failed and cancelled terminals are
/// represented by [`PipelineError`] variants instead, so an error value always
/// records *where* the run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No work started yet.
    Idle,
    /// Producing the research plan (subtopics + search queries).
    AnalyzingTopic,
    /// Executing search queries and filtering sources by credibility.
    Researching,
    /// Recovering bibliographic metadata for the accepted sources.
    ExtractingMetadata,
    /// Generating the structured report draft.
    Drafting,
    /// Scoring the draft for relevance and citation quality.
    Critiquing,
    /// Producing the executive summary and final polish.
    Refining,
    /// Rendering the HTML artefact.
    Exporting,
    /// Run finished successfully.
    Done,
}

impl Stage {
    /// Human-readable stage label used in progress reporting.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AnalyzingTopic => "Topic Analysis",
            Self::Researching => "Web Research",
            Self::ExtractingMetadata => "Metadata Extraction",
            Self::Drafting => "Drafting",
            Self::Critiquing => "Quality Review",
            Self::Refining => "Refinement",
            Self::Exporting => "Generating HTML",
            Self::Done => "Complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// A progress notification emitted by the sequencer.
///
/// Consumers (the CLI progress display, tests) receive these over a channel;
/// emission never blocks the pipeline and delivery failures are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage the pipeline is currently in.
    pub stage: Stage,
    /// Short human-readable description of the current activity.
    pub detail: String,
    /// Overall completion estimate in `[0, 100]`.
    pub percent: u8,
    /// Time elapsed since the run started.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Run request
// ---------------------------------------------------------------------------

/// The validated input for one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Field of study the report covers (e.g. `"Quantum Computing"`).
    pub topic: String,
    /// Academic subject or course the report belongs to.
    pub subject: String,
    /// Name of the requesting researcher, printed on the cover page.
    pub researcher: String,
    /// Institution name, printed on the cover page.
    pub institution: String,
    /// Report date, printed on the cover page.
    pub date: NaiveDate,
    /// Citation format for the reference list.
    pub citation_style: CitationStyle,
}

impl RunRequest {
    /// Checks that all required text fields are non-empty.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let required = [
            ("topic", &self.topic),
            ("subject", &self.subject),
            ("researcher", &self.researcher),
            ("institution", &self.institution),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PipelineError::InvalidRequest {
                    message: format!("required field '{field}' is empty"),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Research plan
// ---------------------------------------------------------------------------

/// The subtopic outline and search queries produced by topic analysis.
///
/// `subtopics` and `queries` follow the JSON shape the reasoning model is
/// asked to return (`subtopics` / `researchQueries`). `topic` and `subject`
/// are stamped from the run request after parsing; a model response never
/// overrides them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchPlan {
    /// Report topic the plan was derived from.
    #[serde(default)]
    pub topic: String,
    /// Academic subject area framing the queries.
    #[serde(default)]
    pub subject: String,
    /// Specific aspects of the topic the report should cover.
    #[serde(default)]
    pub subtopics: Vec<String>,
    /// Web search queries targeting academic sources.
    #[serde(default, rename = "researchQueries")]
    pub queries: Vec<String>,
}

impl ResearchPlan {
    /// Returns `true` if the plan has both subtopics and queries.
    ///
    /// A plan missing either list is discarded in favour of the deterministic
    /// template plan.
    pub fn is_usable(&self) -> bool {
        !self.subtopics.is_empty() && !self.queries.is_empty()
    }

    /// Builds the deterministic fallback plan used whenever topic analysis
    /// fails or returns an unusable payload. The run proceeds on this plan
    /// rather than aborting.
    pub fn template(topic: &str, subject: &str) -> Self {
        Self {
            topic: topic.to_string(),
            subject: subject.to_string(),
            subtopics: vec![
                format!("Foundations of {topic}"),
                format!("Recent Advances in {topic}"),
                format!("Applications of {topic}"),
                format!("Challenges in {topic}"),
                format!("Future of {topic}"),
            ],
            queries: vec![
                format!("{topic} research 2024"),
                format!("{topic} academic papers"),
                format!("{topic} recent developments"),
                format!("{topic} applications"),
                format!("{topic} future trends"),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Bibliographic metadata recovered for a source.
///
/// Fields are `None` until some extraction strategy fills them; citation
/// formatting substitutes conventional fallbacks for anything still missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Work title.
    pub title: Option<String>,
    /// Author list as a display string (e.g. `"Smith, J. and Lee, K."`).
    pub authors: Option<String>,
    /// Publication year.
    pub year: Option<String>,
    /// Journal, conference, or publishing venue.
    pub venue: Option<String>,
    /// Digital object identifier, when one can be recovered.
    pub doi: Option<String>,
}

/// A source that passed credibility filtering and entered the citation pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Identifier assigned when the search hit was first recorded.
    pub id: SourceId,
    /// Normalised source URL.
    pub url: String,
    /// Host extracted from the URL; the credibility table matched on this.
    pub domain: DomainName,
    /// Score assigned by the credibility table.
    pub credibility: CredibilityScore,
    /// Whether the source was admitted to the citation pool.
    pub accepted: bool,
    /// Human-readable account of the credibility verdict.
    pub justification: String,
    /// The search query that surfaced this URL.
    pub query: String,
    /// Text surrounding the URL in the search output; later mined for titles.
    pub context: String,
    /// When the source was retrieved.
    pub date_accessed: DateTime<Utc>,
    /// Recovered bibliographic metadata.
    pub metadata: SourceMetadata,
}

/// Audit record for a source discarded during research.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedSource {
    /// The discarded URL.
    pub url: String,
    /// The search query that surfaced it.
    pub query: String,
    /// Why it was discarded (e.g. which rejection pattern matched).
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Report draft
// ---------------------------------------------------------------------------

/// One titled body section of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftSection {
    /// Section heading.
    #[serde(default)]
    pub title: String,
    /// Section body text.
    #[serde(default)]
    pub content: String,
}

/// The structured report draft produced by the drafting stage.
///
/// Serialised form matches the JSON shape the reasoning model is asked to
/// return; every key is optional on the wire and [`ReportDraft::fill_missing`]
/// substitutes placeholders so rendering never encounters an absent section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    /// Abstract paragraph.
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    /// Introduction section.
    #[serde(default)]
    pub introduction: String,
    /// Literature review section.
    #[serde(default)]
    pub literature_review: String,
    /// Three to four titled body sections.
    #[serde(default)]
    pub main_sections: Vec<DraftSection>,
    /// Data and analysis section.
    #[serde(default)]
    pub data_analysis: String,
    /// Challenges section.
    #[serde(default)]
    pub challenges: String,
    /// Future outlook section.
    #[serde(default)]
    pub future_outlook: String,
    /// Conclusion section.
    #[serde(default)]
    pub conclusion: String,
}

impl ReportDraft {
    /// Replaces absent sections with minimal placeholders so every section
    /// renders. Mirrors the defaults applied when the model response omits or
    /// empties a key.
    pub fn fill_missing(&mut self) {
        let scalar_fields = [
            &mut self.abstract_text,
            &mut self.introduction,
            &mut self.literature_review,
            &mut self.data_analysis,
            &mut self.challenges,
            &mut self.future_outlook,
            &mut self.conclusion,
        ];
        for field in scalar_fields {
            if field.trim().is_empty() {
                *field = "Section.".to_string();
            }
        }
        if self.main_sections.is_empty() {
            self.main_sections.push(DraftSection {
                title: "Analysis".to_string(),
                content: "Content.".to_string(),
            });
        }
    }

    /// Counts `[Source N]` citation markers across the draft body
    /// (case-insensitive). Used by the critique heuristic.
    pub fn citation_mentions(&self) -> usize {
        let mut text = String::new();
        for part in [
            &self.abstract_text,
            &self.introduction,
            &self.literature_review,
            &self.data_analysis,
            &self.challenges,
            &self.future_outlook,
            &self.conclusion,
        ] {
            text.push_str(part);
            text.push('\n');
        }
        for section in &self.main_sections {
            text.push_str(&section.title);
            text.push('\n');
            text.push_str(&section.content);
            text.push('\n');
        }
        text.to_ascii_lowercase().matches("[source").count()
    }
}

// ---------------------------------------------------------------------------
// Critique
// ---------------------------------------------------------------------------

/// Quality scores for a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Critique {
    /// How well the draft stays on the requested topic, `[0, 100]`.
    pub topic_relevance: u8,
    /// How well sources are cited throughout the body, `[0, 100]`.
    pub citation_quality: u8,
    /// Overall quality estimate, `[0, 100]`.
    pub overall_score: u8,
    /// Suggested improvements.
    pub recommendations: Vec<String>,
}

impl Default for Critique {
    fn default() -> Self {
        Self {
            topic_relevance: 0,
            citation_quality: 0,
            overall_score: 0,
            recommendations: Vec::new(),
        }
    }
}

impl Critique {
    /// Local fallback critique derived from citation density alone.
    ///
    /// Used when the remote critique call fails; `citation_mentions` comes
    /// from [`ReportDraft::citation_mentions`].
    pub fn heuristic(citation_mentions: usize) -> Self {
        let citation_quality = 90.min(60_usize.saturating_add(citation_mentions * 2)) as u8;
        Self {
            topic_relevance: 80,
            citation_quality,
            overall_score: 80,
            recommendations: vec!["Success".to_string()],
        }
    }
}

// ---------------------------------------------------------------------------
// Refined report
// ---------------------------------------------------------------------------

/// The final report: the draft plus the executive summary added during
/// refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedReport {
    /// Executive summary paragraph, shown before the abstract.
    pub executive_summary: String,
    /// The (possibly polished) report body.
    pub draft: ReportDraft,
}

impl RefinedReport {
    /// Local fallback refinement: wraps the draft with the deterministic
    /// executive-summary template. Used when the remote refinement call fails.
    pub fn with_template_summary(draft: ReportDraft, topic: &str, source_count: usize) -> Self {
        Self {
            executive_summary: format!(
                "This comprehensive report examines {topic}, analyzing key developments, \
                 challenges, and future directions based on {source_count} authoritative \
                 academic sources."
            ),
            draft,
        }
    }
}

// ---------------------------------------------------------------------------
// Run state and results
// ---------------------------------------------------------------------------

/// Mutable state for an in-flight run.
///
/// Owned by the sequencer; each stage reads what it needs and deposits its
/// output here before the run advances.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    /// Run identifier, carried in spans and progress output.
    pub id: RunId,
    /// The validated request that started this run.
    pub request: RunRequest,
    /// Current stage.
    pub stage: Stage,
    /// Research plan, present once topic analysis finishes.
    pub plan: Option<ResearchPlan>,
    /// Accepted sources in citation order.
    pub sources: Vec<Source>,
    /// Audit trail of discarded sources.
    pub rejected: Vec<RejectedSource>,
    /// Structured draft, present once drafting finishes.
    pub draft: Option<ReportDraft>,
    /// Quality scores, present once critique finishes.
    pub critique: Option<Critique>,
    /// Final report, present once refinement finishes.
    pub report: Option<RefinedReport>,
}

impl PipelineRun {
    /// Starts a fresh run in the [`Stage::Idle`] state.
    pub fn new(request: RunRequest) -> Self {
        Self {
            id: RunId::new_random(),
            request,
            stage: Stage::Idle,
            plan: None,
            sources: Vec::new(),
            rejected: Vec::new(),
            draft: None,
            critique: None,
            report: None,
        }
    }

    /// Number of sources currently in the citation pool.
    pub fn accepted_count(&self) -> usize {
        self.sources.len()
    }
}

/// Aggregate counters reported when a run finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Total remote call attempts made (including retries).
    pub api_calls: u64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Sources admitted to the citation pool.
    pub accepted_sources: usize,
    /// Sources discarded during research.
    pub rejected_sources: usize,
}

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    /// Run identifier.
    pub id: RunId,
    /// The request that started the run.
    pub request: RunRequest,
    /// The final report.
    pub report: RefinedReport,
    /// Quality scores for the draft.
    pub critique: Critique,
    /// Accepted sources in citation order.
    pub sources: Vec<Source>,
    /// Audit trail of discarded sources.
    pub rejected: Vec<RejectedSource>,
    /// Rendered HTML artefact.
    pub html: String,
    /// Aggregate run counters.
    pub stats: RunStats,
}

// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credibility_score_rejects_out_of_range() {
        assert!(CredibilityScore::new(100).is_some());
        assert!(CredibilityScore::new(101).is_none());
        assert_eq!(CredibilityScore::clamped(250).as_u8(), 100);
    }

    #[test]
    fn citation_style_parses_case_insensitively() {
        assert_eq!("APA".parse::<CitationStyle>().unwrap(), CitationStyle::Apa);
        assert_eq!("ieee".parse::<CitationStyle>().unwrap(), CitationStyle::Ieee);
        assert!("chicago".parse::<CitationStyle>().is_err());
    }

    #[test]
    fn template_plan_is_usable_and_topic_specific() {
        let plan = ResearchPlan::template("Quantum Computing", "Computer Science");
        assert!(plan.is_usable());
        assert_eq!(plan.topic, "Quantum Computing");
        assert_eq!(plan.subject, "Computer Science");
        assert_eq!(plan.subtopics.len(), 5);
        assert_eq!(plan.queries.len(), 5);
        assert_eq!(plan.queries[0], "Quantum Computing research 2024");
    }

    #[test]
    fn empty_plan_is_not_usable() {
        let plan = ResearchPlan {
            subtopics: vec!["Foundations".to_string()],
            ..ResearchPlan::default()
        };
        assert!(!plan.is_usable());
    }

    #[test]
    fn draft_parses_from_model_json_shape() {
        let json = r#"{
            "abstract": "A study.",
            "introduction": "Intro.",
            "literatureReview": "Review.",
            "mainSections": [{"title": "Methods", "content": "Body."}],
            "dataAnalysis": "Data.",
            "challenges": "Hard.",
            "futureOutlook": "Bright.",
            "conclusion": "Done."
        }"#;
        let draft: ReportDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.abstract_text, "A study.");
        assert_eq!(draft.literature_review, "Review.");
        assert_eq!(draft.main_sections[0].title, "Methods");
    }

    #[test]
    fn fill_missing_substitutes_placeholders() {
        let mut draft: ReportDraft = serde_json::from_str(r#"{"abstract": "Kept."}"#).unwrap();
        draft.fill_missing();
        assert_eq!(draft.abstract_text, "Kept.");
        assert_eq!(draft.introduction, "Section.");
        assert_eq!(draft.main_sections.len(), 1);
        assert_eq!(draft.main_sections[0].title, "Analysis");
        assert_eq!(draft.main_sections[0].content, "Content.");
    }

    #[test]
    fn citation_mentions_counts_across_sections() {
        let mut draft = ReportDraft::default();
        draft.introduction = "As shown [Source 1] and [source 2].".to_string();
        draft.main_sections.push(DraftSection {
            title: "Methods".to_string(),
            content: "Following [Source 3].".to_string(),
        });
        assert_eq!(draft.citation_mentions(), 3);
    }

    #[test]
    fn heuristic_critique_caps_citation_quality() {
        let sparse = Critique::heuristic(2);
        assert_eq!(sparse.citation_quality, 64);
        assert_eq!(sparse.topic_relevance, 80);
        assert_eq!(sparse.overall_score, 80);

        let dense = Critique::heuristic(40);
        assert_eq!(dense.citation_quality, 90);
    }

    #[test]
    fn template_summary_names_topic_and_source_count() {
        let refined = RefinedReport::with_template_summary(ReportDraft::default(), "Robotics", 7);
        assert!(refined.executive_summary.contains("Robotics"));
        assert!(refined.executive_summary.contains("7 authoritative academic sources"));
    }

    #[test]
    fn run_request_validation_flags_empty_fields() {
        let request = RunRequest {
            topic: "Quantum Computing".to_string(),
            subject: "  ".to_string(),
            researcher: "A. Turing".to_string(),
            institution: "Bletchley".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            citation_style: CitationStyle::Apa,
        };
        let err = request.validate().unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest { .. }));
    }
}
