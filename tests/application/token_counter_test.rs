use bomatic::application::services::{count_tokens, estimate_tokens, heuristic_tokens};

#[test]
fn given_empty_string_when_counting_then_returns_zero() {
    assert_eq!(count_tokens(""), 0);
    assert_eq!(estimate_tokens("", "gemini-2.5-pro"), 0);
}

#[test]
fn given_known_sentence_when_counting_then_returns_expected_range() {
    let result = count_tokens("Hello, world!");
    assert!(result > 0);
    assert!(result < 10);
}

#[test]
fn given_known_openai_model_when_estimating_then_tokenizer_used() {
    let text = "The quick brown fox jumps over the lazy dog.";

    let estimate = estimate_tokens(text, "gpt-4o");

    assert!(estimate < heuristic_tokens(text));
}

#[test]
fn given_unknown_model_when_estimating_then_two_chars_per_token() {
    assert_eq!(estimate_tokens("abcdefg", "gemini-2.5-flash"), 4);
    assert_eq!(estimate_tokens("상담 기록", "gemini-2.5-flash"), 3);
}
