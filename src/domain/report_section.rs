/// One header row of the report template together with its requested sub-items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub header: String,
    pub subitems: Vec<String>,
}

impl ReportSection {
    pub fn new(header: impl Into<String>, subitems: Vec<String>) -> Self {
        Self {
            header: header.into(),
            subitems,
        }
    }

    pub fn as_analysis_item(&self) -> String {
        let subitems: Vec<&str> = self
            .subitems
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        if subitems.is_empty() {
            self.header.trim().to_string()
        } else {
            format!("{}: {}", self.header.trim(), subitems.join(", "))
        }
    }
}

pub fn format_analysis_items(sections: &[ReportSection]) -> Vec<String> {
    sections
        .iter()
        .filter(|s| !s.header.trim().is_empty())
        .map(ReportSection::as_analysis_item)
        .collect()
}
