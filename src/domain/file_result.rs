use serde::{Deserialize, Serialize};

/// Outcome of a fully processed file. `analysis` may be a fallback notice when every
/// model in the chain failed; the transcript is always real.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResult {
    pub group: String,
    pub transcript: String,
    pub analysis: String,
}

impl FileResult {
    pub fn new(group: String, transcript: String, analysis: String) -> Self {
        Self {
            group,
            transcript,
            analysis,
        }
    }
}
