use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{Completion, CompletionStatus, LlmClient, LlmClientError};
use crate::infrastructure::observability::sanitize_for_log;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// OpenAI chat completions.
///
/// Reasoning-era models (`gpt-5*`, `o*`) take the instructions as a `developer` message
/// and only accept `max_completion_tokens` with the default temperature.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            max_output_tokens,
            temperature,
        }
    }

    fn is_reasoning_model(model: &str) -> bool {
        model.starts_with("gpt-5") || model.starts_with('o')
    }

    fn build_request<'a>(
        &self,
        model: &'a str,
        system_prompt: &'a str,
        user_text: &'a str,
    ) -> ChatCompletionRequest<'a> {
        let reasoning = Self::is_reasoning_model(model);
        ChatCompletionRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: if reasoning { "developer" } else { "system" },
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_text,
                },
            ],
            max_tokens: (!reasoning).then_some(self.max_output_tokens),
            max_completion_tokens: reasoning.then_some(self.max_output_tokens),
            temperature: (!reasoning).then_some(self.temperature),
        }
    }
}

fn finish_status(reason: Option<&str>) -> CompletionStatus {
    match reason {
        Some("stop") => CompletionStatus::Completed,
        Some("length") => CompletionStatus::Truncated,
        Some("content_filter") => CompletionStatus::SafetyBlocked,
        Some(other) => CompletionStatus::Unknown(other.to_string()),
        None => CompletionStatus::Unknown("missing".to_string()),
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[tracing::instrument(skip(self, system_prompt, user_text), fields(provider = "openai"))]
    async fn complete(
        &self,
        model: &str,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<Completion, LlmClientError> {
        let request_body = self.build_request(model, system_prompt, user_text);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmClientError::ApiRequestFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(body = %sanitize_for_log(&body), "OpenAI rate limited");
            return Err(LlmClientError::RateLimited(format!("429: {}", body)));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %sanitize_for_log(&body), "OpenAI request failed");
            return Err(LlmClientError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let completion_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmClientError::InvalidResponse(e.to_string()))?;

        let choice = completion_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmClientError::InvalidResponse("empty choices".to_string()))?;

        let status = if choice.message.refusal.is_some() {
            CompletionStatus::SafetyBlocked
        } else {
            finish_status(choice.finish_reason.as_deref())
        };

        tracing::debug!(?status, "OpenAI completion received");

        Ok(Completion {
            status,
            text: choice.message.content,
        })
    }
}
