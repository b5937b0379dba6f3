//! Self-contained HTML report document.
//!
//! The artefact is a single print-oriented HTML file with a fixed section
//! order: cover page, executive summary, abstract, introduction, literature
//! review, the draft's topical sections, data & analysis, challenges, future
//! outlook, conclusion, references. The stylesheet is embedded so the file
//! needs nothing else to render or to print to PDF.
//!
//! Requester-supplied cover fields and source metadata are escaped; the
//! report body is emitted as generated.

use pipeline::{RefinedReport, RunRequest, Source};

use crate::citation::format_citation;

/// Escapes text for embedding in HTML content or attribute positions.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Renders the complete report document.
pub fn render(request: &RunRequest, report: &RefinedReport, sources: &[Source]) -> String {
    let topic = escape(&request.topic);
    let subject = escape(&request.subject);
    let researcher = escape(&request.researcher);
    let institution = escape(&request.institution);
    let report_date = request.date.format("%B %d, %Y").to_string();
    let style = request.citation_style;
    let draft = &report.draft;

    let mut html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{topic} - Research Report</title>
    <style>
        @page {{ margin: 1in; }}
        body {{ font-family: 'Times New Roman', serif; font-size: 12pt; line-height: 1.6; color: #000; max-width: 8.5in; margin: 0 auto; padding: 0.5in; }}
        .cover {{ text-align: center; padding-top: 2in; page-break-after: always; }}
        .cover h1 {{ font-size: 24pt; font-weight: bold; margin: 1in 0 0.5in 0; }}
        .cover .meta {{ font-size: 14pt; margin: 0.25in 0; }}
        h1 {{ font-size: 18pt; margin-top: 0.5in; border-bottom: 2px solid #333; padding-bottom: 0.1in; }}
        h2 {{ font-size: 14pt; margin-top: 0.3in; font-weight: bold; }}
        p {{ text-align: justify; margin: 0.15in 0; }}
        .abstract {{ font-style: italic; margin: 0.25in 0.5in; }}
        .references {{ page-break-before: always; }}
        .ref-item {{ margin: 0.15in 0 0.15in 0.5in; text-indent: -0.5in; padding-left: 0.5in; font-size: 10pt; line-height: 1.4; }}
        .ref-item a {{ color: #0066CC; text-decoration: none; }}
        .ref-item a:hover {{ text-decoration: underline; }}
    </style>
</head>
<body>
    <div class="cover">
        <h1>{topic}</h1>
        <div class="meta">Research Report</div>
        <div class="meta">Subject: {subject}</div>
        <div class="meta" style="margin-top: 1in;">{researcher}<br>{institution}<br>{report_date}</div>
        <div class="meta" style="margin-top: 0.5in; font-size: 10pt;">{style} Citation Format</div>
    </div>
    <h1>Executive Summary</h1>
    <p>{executive_summary}</p>
    <h1>Abstract</h1>
    <div class="abstract">{abstract_text}</div>
    <h1>Introduction</h1>
    <p>{introduction}</p>
    <h1>Literature Review</h1>
    <p>{literature_review}</p>
"#,
        executive_summary = report.executive_summary,
        abstract_text = draft.abstract_text,
        introduction = draft.introduction,
        literature_review = draft.literature_review,
    );

    for section in &draft.main_sections {
        html.push_str(&format!(
            "    <h2>{}</h2>\n    <p>{}</p>\n",
            section.title, section.content
        ));
    }

    html.push_str(&format!(
        r#"    <h1>Data & Analysis</h1>
    <p>{data_analysis}</p>
    <h1>Challenges</h1>
    <p>{challenges}</p>
    <h1>Future Outlook</h1>
    <p>{future_outlook}</p>
    <h1>Conclusion</h1>
    <p>{conclusion}</p>
    <div class="references">
        <h1>References</h1>
"#,
        data_analysis = draft.data_analysis,
        challenges = draft.challenges,
        future_outlook = draft.future_outlook,
        conclusion = draft.conclusion,
    ));

    for (index, source) in sources.iter().enumerate() {
        let citation = format_citation(source, index + 1, style);
        html.push_str(&format!("        <div class=\"ref-item\">{citation}</div>\n"));
    }

    html.push_str("    </div>\n</body>\n</html>");
    html
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use pipeline::{
        CitationStyle, CredibilityScore, DomainName, DraftSection, ReportDraft, SourceId,
        SourceMetadata,
    };

    use super::*;

    fn request(style: CitationStyle) -> RunRequest {
        RunRequest {
            topic: "Quantum Computing".to_string(),
            subject: "Computer Science".to_string(),
            researcher: "A. Researcher".to_string(),
            institution: "Science & Tech Institute".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            citation_style: style,
        }
    }

    fn report() -> RefinedReport {
        let mut draft = ReportDraft::default();
        draft.abstract_text = "An abstract.".to_string();
        draft.introduction = "An introduction [Source 1].".to_string();
        draft.literature_review = "A review.".to_string();
        draft.main_sections.push(DraftSection {
            title: "Hardware Progress".to_string(),
            content: "Body text [Source 2].".to_string(),
        });
        draft.data_analysis = "Numbers.".to_string();
        draft.challenges = "Decoherence.".to_string();
        draft.future_outlook = "Promising.".to_string();
        draft.conclusion = "Summary.".to_string();
        RefinedReport {
            executive_summary: "Executive view.".to_string(),
            draft,
        }
    }

    fn source(host: &str, url: &str) -> Source {
        Source {
            id: SourceId::new_random(),
            url: url.to_string(),
            domain: DomainName::new(host).unwrap(),
            credibility: CredibilityScore::clamped(95),
            accepted: true,
            justification: format!("Trusted: {host}"),
            query: "quantum computing research 2024".to_string(),
            context: String::new(),
            date_accessed: Utc::now(),
            metadata: SourceMetadata::default(),
        }
    }

    #[test]
    fn sections_appear_in_the_fixed_order() {
        let html = render(&request(CitationStyle::Apa), &report(), &[]);
        let headings = [
            "<h1>Executive Summary</h1>",
            "<h1>Abstract</h1>",
            "<h1>Introduction</h1>",
            "<h1>Literature Review</h1>",
            "<h2>Hardware Progress</h2>",
            "<h1>Data & Analysis</h1>",
            "<h1>Challenges</h1>",
            "<h1>Future Outlook</h1>",
            "<h1>Conclusion</h1>",
            "<h1>References</h1>",
        ];
        let mut last = 0;
        for heading in headings {
            let at = html.find(heading).unwrap_or_else(|| panic!("missing {heading}"));
            assert!(at > last, "{heading} out of order");
            last = at;
        }
    }

    #[test]
    fn cover_page_carries_the_request_fields() {
        let html = render(&request(CitationStyle::Apa), &report(), &[]);
        assert!(html.contains("<h1>Quantum Computing</h1>"));
        assert!(html.contains("Subject: Computer Science"));
        assert!(html.contains("A. Researcher<br>Science &amp; Tech Institute<br>June 01, 2025"));
        assert!(html.contains("APA Citation Format"));
    }

    #[test]
    fn every_source_becomes_a_reference_entry() {
        let sources = vec![
            source("web.mit.edu", "https://web.mit.edu/quantum/paper"),
            source("arxiv.org", "https://arxiv.org/abs/2301.00001"),
            source("example.gov", "https://example.gov/report"),
        ];
        let html = render(&request(CitationStyle::Ieee), &report(), &sources);
        assert_eq!(html.matches("class=\"ref-item\"").count(), 3);
        assert!(html.contains("[1] "));
        assert!(html.contains("[3] "));
        assert!(html.contains("IEEE Citation Format"));
    }

    #[test]
    fn body_text_is_not_escaped() {
        let mut refined = report();
        refined.draft.introduction = "Uses <em>emphasis</em> markup.".to_string();
        let html = render(&request(CitationStyle::Apa), &refined, &[]);
        assert!(html.contains("Uses <em>emphasis</em> markup."));
    }

    #[test]
    fn document_is_self_contained() {
        let html = render(&request(CitationStyle::Apa), &report(), &[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("font-family: 'Times New Roman'"));
    }
}
