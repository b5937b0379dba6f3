//! Request templates for each pipeline stage.
//!
//! Every builder returns a fully-formed [`GenerationRequest`] carrying the
//! stage's token budget, so stage modules never assemble prompt text
//! themselves. Templates instruct the service to answer with bare JSON;
//! [`crate::parse`] tolerates the fenced and prose-wrapped variants that
//! come back anyway.

use pipeline::{GenerationRequest, ReportDraft, Source};

use crate::extract::truncate_chars;

const ANALYZE_MAX_TOKENS: u32 = 800;
const SEARCH_MAX_TOKENS: u32 = 1_500;
const METADATA_MAX_TOKENS_PER_SOURCE: u32 = 600;
const DRAFT_MAX_TOKENS: u32 = 6_000;
const CRITIQUE_MAX_TOKENS: u32 = 800;
const REFINE_MAX_TOKENS: u32 = 600;

/// Wordings substituted for the topic in the draft prompt so the generated
/// prose does not repeat the topic verbatim throughout.
pub fn phrase_variations(topic: &str) -> Vec<String> {
    vec![
        topic.to_string(),
        format!("the field of {topic}"),
        format!("{topic} research"),
        "this domain".to_string(),
        "this research area".to_string(),
        format!("the {topic} field"),
    ]
}

/// Topic-analysis request: subtopics and search queries as JSON.
pub fn analyze_request(topic: &str, subject: &str) -> GenerationRequest {
    let prompt = format!(
        "Research plan for \"{topic}\" in {subject}.\n\n\
         Create:\n\
         1. 5 specific subtopics about \"{topic}\"\n\
         2. 5 search queries for academic sources (2020-2025)\n\n\
         Target: .edu, .gov, IEEE, arXiv, ACM\n\n\
         Return ONLY JSON:\n\
         {{\n\
         \x20 \"subtopics\": [\"aspect 1\", \"aspect 2\", ...],\n\
         \x20 \"researchQueries\": [\"query 1\", \"query 2\", ...]\n\
         }}"
    );
    GenerationRequest::new(prompt).with_max_tokens(ANALYZE_MAX_TOKENS)
}

/// Web-search request for one research query.
pub fn search_request(query: &str) -> GenerationRequest {
    let prompt = format!(
        "Search: {query}\n\n\
         Find recent academic papers from .edu, .gov, IEEE, ACM, arXiv.\n\
         Provide URLs and context."
    );
    GenerationRequest::new(prompt)
        .with_max_tokens(SEARCH_MAX_TOKENS)
        .with_web_search()
}

/// Batched title-extraction request covering every source in one call.
///
/// Sources are numbered from 1 in listing order; the response echoes the
/// numbers so results map back even when some entries are omitted.
pub fn metadata_batch_request(sources: &[&Source]) -> GenerationRequest {
    let mut listing = String::new();
    for (position, source) in sources.iter().enumerate() {
        let metadata = &source.metadata;
        let authors = metadata.authors.as_deref().unwrap_or("Research Team");
        let year = metadata.year.as_deref().unwrap_or(crate::extract::DEFAULT_YEAR);
        listing.push_str(&format!(
            "Source {index}\n\
             URL: {url}\n\
             Known authors: {authors}\n\
             Known year: {year}\n\
             Context:\n\
             {context}\n\n",
            index = position + 1,
            url = source.url,
            context = truncate_chars(&source.context, 1_200),
        ));
    }

    let prompt = format!(
        "Extract the EXACT paper title for each numbered source below.\n\n\
         {listing}\
         Return ONLY JSON:\n\
         {{\n\
         \x20 \"sources\": [\n\
         \x20   {{\"index\": 1, \"title\": \"Full exact title of the research paper\", \
         \"authors\": \"Author names if visible, otherwise the known authors\", \
         \"year\": \"Publication year if visible, otherwise the known year\"}}\n\
         \x20 ]\n\
         }}\n\n\
         CRITICAL: Each title MUST be the actual paper title, not a placeholder or URL \
         fragment.\n\
         Look for patterns like \"Title:\", quoted text, or the first substantial sentence."
    );
    let budget = METADATA_MAX_TOKENS_PER_SOURCE * sources.len().max(1) as u32;
    GenerationRequest::new(prompt).with_max_tokens(budget)
}

/// Draft-writing request: full report as JSON, citing up to `max_cited`
/// of the listed sources.
pub fn draft_request(
    topic: &str,
    subject: &str,
    subtopics: &[String],
    sources: &[Source],
    max_cited: usize,
) -> GenerationRequest {
    let variations = phrase_variations(topic);

    let listing = sources
        .iter()
        .take(max_cited)
        .enumerate()
        .map(|(position, source)| {
            let metadata = &source.metadata;
            format!(
                "[{index}] {title} ({year})\nAuthors: {authors}\n{url}\nContent: {content}",
                index = position + 1,
                title = metadata.title.as_deref().unwrap_or("Unknown"),
                year = metadata.year.as_deref().unwrap_or(crate::extract::DEFAULT_YEAR),
                authors = metadata.authors.as_deref().unwrap_or("Unknown"),
                url = truncate_chars(&source.url, 70),
                content = truncate_chars(&source.context, 250),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let prompt = format!(
        "Write academic report about \"{topic}\" in {subject}.\n\n\
         PHRASE VARIATION: Use \"{first}\", \"{second}\", \"this domain\" often. \
         Avoid repeating \"{topic}\" more than 5 times.\n\n\
         REQUIREMENTS:\n\
         - Use ONLY provided sources\n\
         - Cite as [Source N]\n\
         - Include data, statistics, years\n\n\
         SUBTOPICS: {subtopics}\n\n\
         SOURCES:\n\
         {listing}\n\n\
         Write: Abstract, Introduction, Literature Review, 3-4 Main Sections, \
         Data & Analysis, Challenges, Future Outlook, Conclusion\n\n\
         Return ONLY valid JSON:\n\
         {{\"abstract\": \"...\", \"introduction\": \"...\", \"literatureReview\": \"...\", \
         \"mainSections\": [{{\"title\": \"...\", \"content\": \"...\"}}], \
         \"dataAnalysis\": \"...\", \"challenges\": \"...\", \"futureOutlook\": \"...\", \
         \"conclusion\": \"...\"}}",
        first = variations[1],
        second = variations[2],
        subtopics = subtopics.join(", "),
    );
    GenerationRequest::new(prompt).with_max_tokens(DRAFT_MAX_TOKENS)
}

/// Critique request: quality scores for the finished draft.
pub fn critique_request(topic: &str, draft: &ReportDraft) -> GenerationRequest {
    let draft_json = serde_json::to_string(draft).unwrap_or_default();
    let prompt = format!(
        "Review this academic report draft about \"{topic}\".\n\n\
         Score topic relevance and citation quality from 0 to 100, give an overall \
         score, and list concrete recommendations.\n\n\
         DRAFT:\n\
         {draft_json}\n\n\
         Return ONLY JSON:\n\
         {{\"topicRelevance\": 0, \"citationQuality\": 0, \"overallScore\": 0, \
         \"recommendations\": [\"...\"]}}"
    );
    GenerationRequest::new(prompt).with_max_tokens(CRITIQUE_MAX_TOKENS)
}

/// Refinement request: an executive summary for the final document.
pub fn refine_request(topic: &str, draft: &ReportDraft, source_count: usize) -> GenerationRequest {
    let prompt = format!(
        "Write a 2-3 sentence executive summary for an academic report about \
         \"{topic}\" based on {source_count} academic sources.\n\n\
         ABSTRACT:\n\
         {abstract_text}\n\n\
         Return ONLY JSON:\n\
         {{\"executiveSummary\": \"...\"}}",
        abstract_text = draft.abstract_text,
    );
    GenerationRequest::new(prompt).with_max_tokens(REFINE_MAX_TOKENS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
