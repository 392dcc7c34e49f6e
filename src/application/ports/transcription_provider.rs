use async_trait::async_trait;

/// Asynchronous speech-to-text service: submit a readable audio locator, then poll.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn submit(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError>;

    async fn poll(&self, request_id: &str) -> Result<TranscriptionPoll, TranscriptionError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub audio_url: String,
    pub language: String,
    pub speaker_diarization: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionState {
    Queued,
    Processing,
    Transcribed,
    Failed,
    Other(String),
}

impl TranscriptionState {
    pub fn from_provider(status: &str) -> Self {
        match status {
            "queued" => Self::Queued,
            "processing" => Self::Processing,
            "transcribed" => Self::Transcribed,
            "failed" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionPoll {
    pub state: TranscriptionState,
    pub text: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("transcription api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("transcription rate limited: {0}")]
    RateLimited(String),
    #[error("invalid transcription response: {0}")]
    InvalidResponse(String),
    #[error("transcription failed: {0}")]
    ProviderFailed(String),
    #[error("transcription timed out after {attempts} polls")]
    TimedOut { attempts: u32 },
    #[error("transcription provider not configured: {0}")]
    NotConfigured(String),
}
