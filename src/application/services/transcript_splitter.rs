use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_MIN_SENTENCES: usize = 20;
pub const DEFAULT_OVERLAP_SENTENCES: usize = 5;

pub const FIRST_PART_DELIMITER: &str = "=== ANALYSIS: FIRST HALF ===";
pub const SECOND_PART_DELIMITER: &str = "=== ANALYSIS: SECOND HALF ===";

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.?!]\s+").expect("sentence boundary regex is valid"));

/// Result of [`TranscriptSplitter::split`]. An empty `second` means the text is
/// analyzed in a single pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitTranscript {
    pub first: String,
    pub second: String,
    /// Sentence count of `first`.
    pub first_sentences: usize,
    /// Index of the sentence `second` starts with.
    pub second_start: usize,
}

impl SplitTranscript {
    fn unsplit(text: &str) -> Self {
        Self {
            first: text.to_string(),
            second: String::new(),
            first_sentences: 0,
            second_start: 0,
        }
    }

    pub fn is_split(&self) -> bool {
        !self.second.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptSplitter {
    min_sentences: usize,
    overlap_sentences: usize,
}

impl TranscriptSplitter {
    pub fn new(min_sentences: usize, overlap_sentences: usize) -> Self {
        Self {
            min_sentences: min_sentences.max(2),
            overlap_sentences,
        }
    }

    pub fn overlap_sentences(&self) -> usize {
        self.overlap_sentences
    }

    /// Splits at the sentence midpoint; the second half repeats the last
    /// `overlap_sentences` sentences of the first.
    pub fn split(&self, text: &str) -> SplitTranscript {
        let sentences = sentences(text);
        if sentences.len() < self.min_sentences {
            return SplitTranscript::unsplit(text);
        }

        let mid = sentences.len() / 2;
        let second_start = mid.saturating_sub(self.overlap_sentences);

        tracing::debug!(
            sentences = sentences.len(),
            mid,
            second_start,
            "Splitting long transcript"
        );

        SplitTranscript {
            first: sentences[..mid].join(" "),
            second: sentences[second_start..].join(" "),
            first_sentences: mid,
            second_start,
        }
    }

    /// User text for the reconciliation call that merges two partial analyses.
    pub fn merge_request(&self, first_analysis: &str, second_analysis: &str) -> String {
        format!(
            "{FIRST_PART_DELIMITER}\n{}\n\n{SECOND_PART_DELIMITER}\n{}",
            first_analysis.trim(),
            second_analysis.trim()
        )
    }
}

impl Default for TranscriptSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SENTENCES, DEFAULT_OVERLAP_SENTENCES)
    }
}

/// Sentences ending in `.`, `?` or `!` followed by whitespace. The terminator stays
/// with its sentence; a trailing fragment without one is kept as the last sentence.
pub fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;

    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // Terminators are single-byte ASCII.
        let end = boundary.start() + 1;
        push_trimmed(&mut out, &text[start..end]);
        start = boundary.end();
    }
    push_trimmed(&mut out, &text[start..]);
    out
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, sentence: &'a str) {
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        out.push(sentence);
    }
}
