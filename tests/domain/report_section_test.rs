use bomatic::domain::{ReportSection, format_analysis_items};

#[test]
fn given_section_without_subitems_when_formatting_then_header_only() {
    let section = ReportSection::new("  Client background ", Vec::new());

    assert_eq!(section.as_analysis_item(), "Client background");
}

#[test]
fn given_section_with_subitems_when_formatting_then_joined_after_colon() {
    let section = ReportSection::new(
        "Client background",
        vec!["family".to_string(), " ".to_string(), "employment".to_string()],
    );

    assert_eq!(
        section.as_analysis_item(),
        "Client background: family, employment"
    );
}

#[test]
fn given_blank_headers_when_formatting_items_then_they_are_skipped_and_order_kept() {
    let sections = vec![
        ReportSection::new("First", Vec::new()),
        ReportSection::new("   ", vec!["orphan".to_string()]),
        ReportSection::new("Second", vec!["detail".to_string()]),
    ];

    let items = format_analysis_items(&sections);

    assert_eq!(items, vec!["First".to_string(), "Second: detail".to_string()]);
}
