use std::future::Future;
use std::time::Duration;

use crate::application::ports::{LlmClientError, TranscriptionError};

pub const TRANSCRIPTION_MAX_ATTEMPTS: u32 = 3;
pub const ANALYSIS_MAX_ATTEMPTS: u32 = 5;
pub const MODEL_FALLBACK_MAX_ATTEMPTS: u32 = 2;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(4);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
pub const DEFAULT_SAFETY_DELAY: Duration = Duration::from_secs(5);

/// Which provider window a rate-limit signal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKind {
    TokensPerMinute,
    RequestsPerMinute,
    Other,
}

impl RateLimitKind {
    /// Fixed waits sized to outlast the provider's window.
    pub fn delay(&self) -> Duration {
        match self {
            RateLimitKind::TokensPerMinute => Duration::from_secs(60),
            RateLimitKind::RequestsPerMinute => Duration::from_secs(30),
            RateLimitKind::Other => Duration::from_secs(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    RateLimited(RateLimitKind),
    SafetyRejection,
    Transient,
    Fatal,
}

/// Detects provider quota signals in an error message.
pub fn classify_rate_limit(message: &str) -> Option<RateLimitKind> {
    let lower = message.to_lowercase();
    if lower.contains("tokens per min") {
        Some(RateLimitKind::TokensPerMinute)
    } else if lower.contains("requests per min") {
        Some(RateLimitKind::RequestsPerMinute)
    } else if lower.contains("429")
        || lower.contains("rate_limit_exceeded")
        || lower.contains("resource_exhausted")
        || lower.contains("quota")
    {
        Some(RateLimitKind::Other)
    } else {
        None
    }
}

pub trait RetryableError: std::fmt::Display {
    fn failure_class(&self) -> FailureClass;
}

impl RetryableError for LlmClientError {
    fn failure_class(&self) -> FailureClass {
        match self {
            LlmClientError::RateLimited(message) => FailureClass::RateLimited(
                classify_rate_limit(message).unwrap_or(RateLimitKind::Other),
            ),
            LlmClientError::SafetyBlocked(_) => FailureClass::SafetyRejection,
            LlmClientError::NotConfigured(_) => FailureClass::Fatal,
            other => classify_rate_limit(&other.to_string())
                .map(FailureClass::RateLimited)
                .unwrap_or(FailureClass::Transient),
        }
    }
}

impl RetryableError for TranscriptionError {
    fn failure_class(&self) -> FailureClass {
        match self {
            TranscriptionError::RateLimited(message) => FailureClass::RateLimited(
                classify_rate_limit(message).unwrap_or(RateLimitKind::Other),
            ),
            TranscriptionError::ProviderFailed(_)
            | TranscriptionError::TimedOut { .. }
            | TranscriptionError::NotConfigured(_) => FailureClass::Fatal,
            other => classify_rate_limit(&other.to_string())
                .map(FailureClass::RateLimited)
                .unwrap_or(FailureClass::Transient),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    GiveUp,
    RetryAfter(Duration),
}

/// Bounded retry with failure-aware delays.
///
/// Rate-limit failures wait a fixed time keyed by the limit type. A first safety
/// rejection is retried unchanged after `safety_delay`; later ones back off like any
/// transient failure (`base_delay * 2^(attempt-1)`, capped at `max_delay`). Fatal
/// failures and exhausted budgets return the last error to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub safety_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            safety_delay: DEFAULT_SAFETY_DELAY,
        }
    }

    pub fn transcription() -> Self {
        Self::new(TRANSCRIPTION_MAX_ATTEMPTS)
    }

    pub fn analysis() -> Self {
        Self::new(ANALYSIS_MAX_ATTEMPTS)
    }

    pub fn model_fallback() -> Self {
        Self::new(MODEL_FALLBACK_MAX_ATTEMPTS)
    }

    pub fn with_delays(mut self, base: Duration, max: Duration, safety: Duration) -> Self {
        self.base_delay = base;
        self.max_delay = max.max(base);
        self.safety_delay = safety;
        self
    }

    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay)
    }

    /// Delay before the next try after `error` failed attempt number `attempt`.
    pub fn wait_strategy<E: RetryableError + ?Sized>(&self, attempt: u32, error: &E) -> Duration {
        self.delay_for(attempt, error.failure_class(), 0)
    }

    pub fn should_retry<E: RetryableError + ?Sized>(&self, attempt: u32, error: &E) -> RetryDecision {
        self.decide(attempt, error.failure_class(), 0)
    }

    fn decide(&self, attempt: u32, class: FailureClass, safety_rejections: u32) -> RetryDecision {
        if attempt >= self.max_attempts || class == FailureClass::Fatal {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(self.delay_for(attempt, class, safety_rejections))
    }

    fn delay_for(&self, attempt: u32, class: FailureClass, safety_rejections: u32) -> Duration {
        match class {
            FailureClass::RateLimited(kind) => kind.delay(),
            FailureClass::SafetyRejection if safety_rejections == 0 => self.safety_delay,
            FailureClass::SafetyRejection | FailureClass::Transient | FailureClass::Fatal => {
                self.backoff_delay(attempt)
            }
        }
    }

    /// Runs `operation` until it succeeds or the policy gives up. The closure receives
    /// the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        let mut safety_rejections = 0;

        loop {
            attempt += 1;
            let error = match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let class = error.failure_class();
            match self.decide(attempt, class, safety_rejections) {
                RetryDecision::GiveUp => {
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Giving up after retries"
                    );
                    return Err(error);
                }
                RetryDecision::RetryAfter(delay) => {
                    if class == FailureClass::SafetyRejection {
                        safety_rejections += 1;
                    }
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        failure = ?class,
                        delay_secs = delay.as_secs_f64(),
                        error = %error,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::analysis()
    }
}
