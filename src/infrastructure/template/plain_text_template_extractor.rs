use crate::application::ports::{TemplateExtractor, TemplateExtractorError};
use crate::domain::ReportSection;

const BULLETS: [&str; 4] = ["- ", "* ", "• ", "· "];

/// Reads a text or markdown frame: every plain line opens a section, bulleted lines
/// become sub-items of the section above them.
///
/// ```text
/// # Consultation summary
/// Client background
/// - family
/// - employment
/// Agreed next steps
/// ```
pub struct PlainTextTemplateExtractor;

impl PlainTextTemplateExtractor {
    fn parse(text: &str) -> Vec<ReportSection> {
        let mut sections: Vec<ReportSection> = Vec::new();

        for line in text.lines() {
            let line = collapse_whitespace(line.trim());
            if line.is_empty() {
                continue;
            }

            if let Some(subitem) = strip_bullet(&line) {
                match sections.last_mut() {
                    Some(section) => section.subitems.push(subitem.to_string()),
                    None => sections.push(ReportSection::new(subitem, Vec::new())),
                }
                continue;
            }

            let header = line.trim_start_matches('#').trim();
            if !header.is_empty() {
                sections.push(ReportSection::new(header, Vec::new()));
            }
        }

        sections
    }
}

impl TemplateExtractor for PlainTextTemplateExtractor {
    fn extract_sections(&self, frame: &[u8]) -> Result<Vec<ReportSection>, TemplateExtractorError> {
        let text = std::str::from_utf8(frame)
            .map_err(|e| TemplateExtractorError::Unreadable(e.to_string()))?;
        let text = text.trim_start_matches('\u{feff}');

        let sections = Self::parse(text);
        if sections.is_empty() {
            return Err(TemplateExtractorError::Empty);
        }

        tracing::debug!(sections = sections.len(), "Extracted report sections");
        Ok(sections)
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    BULLETS
        .iter()
        .find_map(|bullet| line.strip_prefix(bullet))
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
