use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    TranscriptionError, TranscriptionProvider, TranscriptionRequest, TranscriptionState,
};

use super::retry_policy::RetryPolicy;

pub const NO_SPEECH_PLACEHOLDER: &str = "(no speech recognized)";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 150;

#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    pub language: String,
    pub speaker_diarization: bool,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            language: "ko-KR".to_string(),
            speaker_diarization: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

/// Submit-then-poll speech-to-text with bounded polling and retried submissions.
pub struct TranscriptionService {
    provider: Arc<dyn TranscriptionProvider>,
    settings: TranscriptionSettings,
    retry_policy: RetryPolicy,
}

impl TranscriptionService {
    pub fn new(
        provider: Arc<dyn TranscriptionProvider>,
        settings: TranscriptionSettings,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            settings,
            retry_policy,
        }
    }

    #[tracing::instrument(skip(self, audio_url))]
    pub async fn transcribe(&self, audio_url: &str) -> Result<String, TranscriptionError> {
        self.retry_policy
            .run("transcription", |_| self.transcribe_once(audio_url))
            .await
    }

    async fn transcribe_once(&self, audio_url: &str) -> Result<String, TranscriptionError> {
        let request = TranscriptionRequest {
            audio_url: audio_url.to_string(),
            language: self.settings.language.clone(),
            speaker_diarization: self.settings.speaker_diarization,
        };

        let request_id = self.provider.submit(&request).await?;
        tracing::info!(request_id = %request_id, "Transcription submitted");

        for attempt in 1..=self.settings.max_poll_attempts {
            let poll = self.provider.poll(&request_id).await?;

            match poll.state {
                TranscriptionState::Transcribed => {
                    let text = poll
                        .text
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| NO_SPEECH_PLACEHOLDER.to_string());
                    tracing::info!(
                        request_id = %request_id,
                        attempt,
                        chars = text.len(),
                        "Transcription completed"
                    );
                    return Ok(text);
                }
                TranscriptionState::Failed => {
                    let reason = poll
                        .error_message
                        .unwrap_or_else(|| "unknown error".to_string());
                    return Err(TranscriptionError::ProviderFailed(reason));
                }
                state => {
                    tracing::trace!(request_id = %request_id, attempt, ?state, "Transcription pending");
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
            }
        }

        tracing::warn!(
            request_id = %request_id,
            attempts = self.settings.max_poll_attempts,
            "Transcription polling timed out"
        );
        Err(TranscriptionError::TimedOut {
            attempts: self.settings.max_poll_attempts,
        })
    }
}
