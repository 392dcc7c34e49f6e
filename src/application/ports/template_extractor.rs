use crate::domain::ReportSection;

/// Pulls the ordered report sections out of an uploaded frame document.
pub trait TemplateExtractor: Send + Sync {
    fn extract_sections(&self, frame: &[u8]) -> Result<Vec<ReportSection>, TemplateExtractorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateExtractorError {
    #[error("unreadable frame document: {0}")]
    Unreadable(String),
    #[error("frame document has no sections")]
    Empty,
}
