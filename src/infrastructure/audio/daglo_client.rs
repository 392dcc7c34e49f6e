use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    TranscriptionError, TranscriptionPoll, TranscriptionProvider, TranscriptionRequest,
    TranscriptionState,
};
use crate::infrastructure::observability::sanitize_for_log;

pub const DAGLO_BASE_URL: &str = "https://apis.daglo.ai/stt/v1/async/transcripts";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Daglo asynchronous speech-to-text. The service downloads the audio itself from the
/// submitted URL.
pub struct DagloClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    audio: AudioSource<'a>,
    language: &'a str,
    stt_config: SttConfig,
}

#[derive(Serialize)]
struct AudioSource<'a> {
    source: SourceUrl<'a>,
}

#[derive(Serialize)]
struct SourceUrl<'a> {
    url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SttConfig {
    speaker_diarization: Toggle,
}

#[derive(Serialize)]
struct Toggle {
    enable: bool,
}

#[derive(Deserialize)]
struct SubmitResponse {
    rid: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollResponse {
    status: String,
    #[serde(default)]
    stt_results: Vec<SttResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct SttResult {
    #[serde(default)]
    transcript: String,
}

impl DagloClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DAGLO_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    async fn check_status(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, TranscriptionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, operation, body = %sanitize_for_log(&body), "Daglo request failed");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TranscriptionError::RateLimited(format!("429: {}", body)));
        }
        Err(TranscriptionError::ApiRequestFailed(format!(
            "{} returned {}: {}",
            operation, status, body
        )))
    }
}

#[async_trait]
impl TranscriptionProvider for DagloClient {
    #[tracing::instrument(skip(self, request), fields(language = %request.language))]
    async fn submit(&self, request: &TranscriptionRequest) -> Result<String, TranscriptionError> {
        let body = SubmitRequest {
            audio: AudioSource {
                source: SourceUrl {
                    url: &request.audio_url,
                },
            },
            language: &request.language,
            stt_config: SttConfig {
                speaker_diarization: Toggle {
                    enable: request.speaker_diarization,
                },
            },
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("submit: {}", e)))?;

        let response = Self::check_status(response, "submit").await?;
        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;

        Ok(submitted.rid)
    }

    async fn poll(&self, request_id: &str) -> Result<TranscriptionPoll, TranscriptionError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, request_id))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| TranscriptionError::ApiRequestFailed(format!("poll: {}", e)))?;

        let response = Self::check_status(response, "poll").await?;
        let polled: PollResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::InvalidResponse(e.to_string()))?;

        let text = polled
            .stt_results
            .into_iter()
            .map(|r| r.transcript)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(TranscriptionPoll {
            state: TranscriptionState::from_provider(&polled.status),
            text: Some(text).filter(|t| !t.is_empty()),
            error_message: polled.error_message,
        })
    }
}
