//! Reference-list citation formatting.
//!
//! Each accepted source becomes one reference entry, formatted per the
//! requested style. Missing metadata never blocks rendering: conventional
//! fallbacks stand in for anything extraction could not recover, and an
//! author list the extractor marked unknown is replaced by the venue's
//! collective authorship form (`"<venue> Authors"`).

use pipeline::{CitationStyle, Source};

use crate::html::escape;

/// Fallback author list when none was extracted.
const FALLBACK_AUTHORS: &str = "Research Team";
/// Fallback title when none was extracted.
const FALLBACK_TITLE: &str = "Research Article";
/// Fallback venue when none was extracted.
const FALLBACK_VENUE: &str = "Academic Publication";
/// Fallback publication year when none was extracted.
const FALLBACK_YEAR: &str = "2024";

/// Formats one reference entry. `index` is the 1-based position in the
/// reference list; APA entries do not display it, IEEE entries do.
pub fn format_citation(source: &Source, index: usize, style: CitationStyle) -> String {
    let meta = &source.metadata;
    let venue = field(meta.venue.as_deref(), FALLBACK_VENUE);
    let year = field(meta.year.as_deref(), FALLBACK_YEAR);

    let mut authors = field(meta.authors.as_deref(), FALLBACK_AUTHORS).to_string();
    let authors_lower = authors.to_lowercase();
    if authors_lower == "unknown" || authors_lower == "author unknown" {
        authors = format!("{venue} Authors");
    }

    let mut title = field(meta.title.as_deref(), FALLBACK_TITLE);
    if title.to_lowercase() == "unknown" {
        title = FALLBACK_TITLE;
    }

    let authors = escape(&authors);
    let title = escape(title);
    let venue = escape(venue);
    let year = escape(year);
    let url = escape(&source.url);

    match style {
        CitationStyle::Apa => format!(
            "{authors} ({year}). {title}. <i>{venue}</i>. Retrieved from \
             <a href=\"{url}\" target=\"_blank\">{url}</a>"
        ),
        CitationStyle::Ieee => format!(
            "[{index}] {authors}, \"{title},\" <i>{venue}</i>, {year}. [Online]. \
             Available: <a href=\"{url}\" target=\"_blank\">{url}</a>"
        ),
    }
}

/// Returns the trimmed value, or `fallback` when absent or blank.
fn field<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim(),
        _ => fallback,
    }
}
