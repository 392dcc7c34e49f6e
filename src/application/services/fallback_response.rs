pub const MAX_LISTED_ITEMS: usize = 10;

/// Analysis text used when every model in a chain has failed.
///
/// Always non-empty. Names the last error, confirms the transcript exists and lists up
/// to [`MAX_LISTED_ITEMS`] requested items.
pub fn fallback_response(last_error: &str, items: &[String]) -> String {
    let mut text = String::from(
        "[Automated analysis unavailable]\n\
         Automated analysis is temporarily unavailable for this recording.\n\n\
         Details:\n\
         - Every configured AI model was tried and failed\n",
    );
    text.push_str(&format!("- Last error: {}\n", last_error.trim()));
    text.push_str("- Speech-to-text completed successfully; the transcript is attached\n\n");
    text.push_str(
        "Next steps:\n\
         1. Retry the analysis later\n\
         2. Review the transcript manually\n",
    );

    if !items.is_empty() {
        text.push_str("\nRequested analysis items:\n");
        for item in items.iter().take(MAX_LISTED_ITEMS) {
            text.push_str(&format!("- {}\n", item));
        }
        if items.len() > MAX_LISTED_ITEMS {
            text.push_str(&format!(
                "- ... and {} more\n",
                items.len() - MAX_LISTED_ITEMS
            ));
        }
    }

    text
}
