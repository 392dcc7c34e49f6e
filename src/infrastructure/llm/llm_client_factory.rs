use std::sync::Arc;

use crate::application::ports::{LlmClient, LlmClientError};
use crate::domain::AiProvider;

use super::gemini_client::GeminiClient;
use super::openai_client::OpenAiClient;

pub struct LlmClientFactory;

impl LlmClientFactory {
    pub fn create(
        provider: AiProvider,
        api_key: Option<String>,
        base_url: Option<String>,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<Arc<dyn LlmClient>, LlmClientError> {
        let key = api_key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            LlmClientError::NotConfigured(format!("API key required for {}", provider))
        })?;

        match provider {
            AiProvider::OpenAi => Ok(Arc::new(OpenAiClient::new(
                key,
                base_url,
                max_output_tokens,
                temperature,
            ))),
            AiProvider::Gemini => Ok(Arc::new(GeminiClient::new(
                key,
                base_url,
                max_output_tokens,
                temperature,
            ))),
        }
    }
}
