use async_trait::async_trait;

/// A single chat-style completion against one model of one provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Completion, LlmClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionStatus {
    Completed,
    Truncated,
    SafetyBlocked,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: CompletionStatus,
    pub text: Option<String>,
}

impl Completion {
    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            status: CompletionStatus::Completed,
            text: Some(text.into()),
        }
    }

    /// Non-empty text from a normal or length-truncated completion.
    pub fn usable_text(&self) -> Option<&str> {
        match self.status {
            CompletionStatus::Completed | CompletionStatus::Truncated => self
                .text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty()),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("content blocked by safety filter: {0}")]
    SafetyBlocked(String),
    #[error("unusable completion: {0}")]
    UnusableCompletion(String),
    #[error("client not configured: {0}")]
    NotConfigured(String),
}
