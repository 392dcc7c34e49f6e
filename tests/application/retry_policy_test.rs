use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::time::Instant;

use bomatic::application::ports::{LlmClientError, TranscriptionError};
use bomatic::application::services::{
    FailureClass, RateLimitKind, RetryDecision, RetryPolicy, RetryableError, classify_rate_limit,
};

#[test]
fn given_provider_messages_when_classifying_then_limit_kind_detected() {
    assert_eq!(
        classify_rate_limit("Rate limit reached on tokens per min (TPM): Limit 30000"),
        Some(RateLimitKind::TokensPerMinute)
    );
    assert_eq!(
        classify_rate_limit("Rate limit reached for Requests Per Min"),
        Some(RateLimitKind::RequestsPerMinute)
    );
    assert_eq!(
        classify_rate_limit("RESOURCE_EXHAUSTED: quota exceeded"),
        Some(RateLimitKind::Other)
    );
    assert_eq!(classify_rate_limit("HTTP 429"), Some(RateLimitKind::Other));
    assert_eq!(classify_rate_limit("connection reset"), None);
}

#[test]
fn given_llm_errors_when_classifying_then_failure_class_matches() {
    assert_eq!(
        LlmClientError::RateLimited("requests per min".to_string()).failure_class(),
        FailureClass::RateLimited(RateLimitKind::RequestsPerMinute)
    );
    assert_eq!(
        LlmClientError::SafetyBlocked("blocked".to_string()).failure_class(),
        FailureClass::SafetyRejection
    );
    assert_eq!(
        LlmClientError::NotConfigured("no key".to_string()).failure_class(),
        FailureClass::Fatal
    );
    assert_eq!(
        LlmClientError::ApiRequestFailed("HTTP 429: slow down".to_string()).failure_class(),
        FailureClass::RateLimited(RateLimitKind::Other)
    );
    assert_eq!(
        LlmClientError::ApiRequestFailed("HTTP 500".to_string()).failure_class(),
        FailureClass::Transient
    );
}

#[test]
fn given_transcription_errors_when_classifying_then_terminal_states_are_fatal() {
    assert_eq!(
        TranscriptionError::ProviderFailed("bad audio".to_string()).failure_class(),
        FailureClass::Fatal
    );
    assert_eq!(
        TranscriptionError::ApiRequestFailed("timeout".to_string()).failure_class(),
        FailureClass::Transient
    );
}

#[test]
fn given_rate_limit_kinds_when_waiting_then_fixed_delays_apply() {
    let policy = RetryPolicy::analysis();

    let tpm = LlmClientError::RateLimited("tokens per min".to_string());
    let rpm = LlmClientError::RateLimited("requests per min".to_string());
    let other = LlmClientError::RateLimited("429".to_string());

    assert_eq!(policy.wait_strategy(1, &tpm), Duration::from_secs(60));
    assert_eq!(policy.wait_strategy(1, &rpm), Duration::from_secs(30));
    assert_eq!(policy.wait_strategy(3, &other), Duration::from_secs(20));
}

#[test]
fn given_last_attempt_when_deciding_then_gives_up() {
    let policy = RetryPolicy::new(3);
    let error = LlmClientError::ApiRequestFailed("HTTP 503".to_string());

    assert_eq!(
        policy.should_retry(2, &error),
        RetryDecision::RetryAfter(Duration::from_secs(8))
    );
    assert_eq!(policy.should_retry(3, &error), RetryDecision::GiveUp);
}

#[tokio::test(start_paused = true)]
async fn given_rpm_limit_then_success_when_running_then_waits_thirty_seconds() {
    let policy = RetryPolicy::analysis();
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    let result: Result<&str, LlmClientError> = policy
        .run("test_op", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 1 {
                    Err(LlmClientError::RateLimited(
                        "Rate limit reached for requests per min".to_string(),
                    ))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() >= Duration::from_secs(30));
    assert!(start.elapsed() < Duration::from_secs(31));
}

#[tokio::test(start_paused = true)]
async fn given_repeated_safety_rejections_when_running_then_first_waits_short_then_backs_off() {
    let policy = RetryPolicy::analysis();

    let start = Instant::now();
    let result: Result<u32, LlmClientError> = policy
        .run("test_op", |attempt| async move {
            if attempt <= 2 {
                Err(LlmClientError::SafetyBlocked("filtered".to_string()))
            } else {
                Ok(attempt)
            }
        })
        .await;

    assert_eq!(result.unwrap(), 3);
    // 5s safety delay, then backoff for attempt 2 (8s).
    assert!(start.elapsed() >= Duration::from_secs(13));
    assert!(start.elapsed() < Duration::from_secs(14));
}

#[tokio::test(start_paused = true)]
async fn given_persistent_failure_when_running_then_stops_at_max_attempts_with_last_error() {
    let policy = RetryPolicy::new(4);
    let calls = AtomicU32::new(0);

    let result: Result<(), LlmClientError> = policy
        .run("test_op", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Err(LlmClientError::ApiRequestFailed(format!("failure {}", attempt))) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(
        result.unwrap_err().to_string(),
        "api request failed: failure 4"
    );
}

#[tokio::test(start_paused = true)]
async fn given_fatal_error_when_running_then_no_retry() {
    let policy = RetryPolicy::analysis();
    let calls = AtomicU32::new(0);

    let start = Instant::now();
    let result: Result<(), LlmClientError> = policy
        .run("test_op", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(LlmClientError::NotConfigured("missing key".to_string())) }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}
