mod gemini_client;
mod llm_client_factory;
mod openai_client;

pub use gemini_client::{GEMINI_BASE_URL, GeminiClient};
pub use llm_client_factory::LlmClientFactory;
pub use openai_client::{OPENAI_BASE_URL, OpenAiClient};
