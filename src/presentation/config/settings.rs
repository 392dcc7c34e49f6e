use std::collections::BTreeMap;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::{
    ChainSettings, ModelLimits, OrchestratorSettings, RetryPolicy, TranscriptSplitter,
    TranscriptionSettings as PollingSettings,
};
use crate::domain::AiProvider;

use super::Environment;

/// Every field has a default, so an empty environment boots a local instance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub storage: StorageSettings,
    pub job_store: JobStoreSettings,
    pub transcription: TranscriptionSettings,
    pub llm: LlmSettings,
    pub rate_limits: RateLimitSettings,
    pub retry: RetrySettings,
    pub batch: BatchSettings,
    pub splitter: SplitterSettings,
}

impl Settings {
    /// Layers `appsettings.{env}.toml` (optional) under `APP_`-prefixed environment
    /// variables, e.g. `APP_LLM__OPENAI__API_KEY`.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str())).required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("llm.openai.models")
                    .with_list_parse_key("llm.gemini.models")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Base of URLs handed to clients and providers by the local store.
    pub public_base_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info,bomatic=debug,tower_http=debug".to_string(),
            enable_json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProviderSetting {
    #[default]
    Local,
    Azure,
    Gcs,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub provider: StorageProviderSetting,
    pub local_path: String,
    pub azure_account: Option<String>,
    pub azure_access_key: Option<String>,
    pub azure_container: Option<String>,
    pub gcs_bucket: Option<String>,
    pub gcs_service_account_path: Option<String>,
    pub upload_url_ttl_secs: u64,
    pub read_url_ttl_secs: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            provider: StorageProviderSetting::Local,
            local_path: "./data/uploads".to_string(),
            azure_account: None,
            azure_access_key: None,
            azure_container: None,
            gcs_bucket: None,
            gcs_service_account_path: None,
            upload_url_ttl_secs: 3600,
            read_url_ttl_secs: 7200,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStoreProvider {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobStoreSettings {
    pub provider: JobStoreProvider,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for JobStoreSettings {
    fn default() -> Self {
        Self {
            provider: JobStoreProvider::Memory,
            database_url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionProviderSetting {
    #[default]
    Daglo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub provider: TranscriptionProviderSetting,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub language: String,
    pub speaker_diarization: bool,
    pub poll_interval_secs: u64,
    pub max_poll_attempts: u32,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            provider: TranscriptionProviderSetting::Daglo,
            api_key: None,
            base_url: None,
            language: "ko-KR".to_string(),
            speaker_diarization: true,
            poll_interval_secs: 2,
            max_poll_attempts: 150,
        }
    }
}

impl TranscriptionSettings {
    pub fn polling(&self) -> PollingSettings {
        PollingSettings {
            language: self.language.clone(),
            speaker_diarization: self.speaker_diarization,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_poll_attempts: self.max_poll_attempts.max(1),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Fallback order, first model tried first.
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub openai: ProviderSettings,
    pub gemini: ProviderSettings,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub max_input_tokens: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            openai: ProviderSettings {
                models: vec!["gpt-5".to_string(), "gpt-4o".to_string()],
                ..ProviderSettings::default()
            },
            gemini: ProviderSettings {
                models: vec!["gemini-2.5-pro".to_string(), "gemini-2.5-flash".to_string()],
                ..ProviderSettings::default()
            },
            temperature: 0.1,
            max_output_tokens: 16_384,
            max_input_tokens: 28_000,
        }
    }
}

impl LlmSettings {
    pub fn provider(&self, provider: AiProvider) -> &ProviderSettings {
        match provider {
            AiProvider::OpenAi => &self.openai,
            AiProvider::Gemini => &self.gemini,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ModelLimitSetting {
    pub max_concurrent: usize,
    pub rpm: u32,
    pub tpm: u32,
}

impl From<ModelLimitSetting> for ModelLimits {
    fn from(s: ModelLimitSetting) -> Self {
        ModelLimits::new(s.max_concurrent, s.rpm, s.tpm)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Applied to models without an entry in `models`.
    pub default: ModelLimitSetting,
    pub models: BTreeMap<String, ModelLimitSetting>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let openai = ModelLimitSetting {
            max_concurrent: 1,
            rpm: 500,
            tpm: 30_000,
        };
        let gemini = ModelLimitSetting {
            max_concurrent: 2,
            rpm: 150,
            tpm: 1_000_000,
        };

        let models = [
            ("gpt-5", openai),
            ("gpt-4o", openai),
            ("gemini-2.5-pro", gemini),
            ("gemini-2.5-flash", gemini),
        ]
        .into_iter()
        .map(|(model, limits)| (model.to_string(), limits))
        .collect();

        Self {
            default: openai,
            models,
        }
    }
}

impl RateLimitSettings {
    pub fn model_limits(&self) -> Vec<(String, ModelLimits)> {
        self.models
            .iter()
            .map(|(model, limits)| (model.clone(), ModelLimits::from(*limits)))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub transcription_max_attempts: u32,
    pub analysis_max_attempts: u32,
    pub model_fallback_max_attempts: u32,
    pub base_delay_secs: u64,
    pub max_delay_secs: u64,
    pub safety_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            transcription_max_attempts: 3,
            analysis_max_attempts: 5,
            model_fallback_max_attempts: 2,
            base_delay_secs: 4,
            max_delay_secs: 60,
            safety_delay_secs: 5,
        }
    }
}

impl RetrySettings {
    fn policy(&self, max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts).with_delays(
            Duration::from_secs(self.base_delay_secs),
            Duration::from_secs(self.max_delay_secs),
            Duration::from_secs(self.safety_delay_secs),
        )
    }

    pub fn transcription_policy(&self) -> RetryPolicy {
        self.policy(self.transcription_max_attempts)
    }

    pub fn analysis_policy(&self) -> RetryPolicy {
        self.policy(self.analysis_max_attempts)
    }

    pub fn model_fallback_policy(&self) -> RetryPolicy {
        self.policy(self.model_fallback_max_attempts)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub max_concurrent_files: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_concurrent_files: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitterSettings {
    pub min_sentences: usize,
    pub overlap_sentences: usize,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            min_sentences: 20,
            overlap_sentences: 5,
        }
    }
}

impl SplitterSettings {
    pub fn splitter(&self) -> TranscriptSplitter {
        TranscriptSplitter::new(self.min_sentences, self.overlap_sentences)
    }
}

impl Settings {
    pub fn chain_settings(&self, provider: AiProvider) -> ChainSettings {
        ChainSettings {
            models: self.llm.provider(provider).models.clone(),
            call_policy: self.retry.analysis_policy(),
            chain_policy: self.retry.model_fallback_policy(),
            max_input_tokens: self.llm.max_input_tokens,
        }
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            upload_url_ttl: Duration::from_secs(self.storage.upload_url_ttl_secs),
            max_concurrent_files: self.batch.max_concurrent_files.max(1),
        }
    }

    pub fn read_url_ttl(&self) -> Duration {
        Duration::from_secs(self.storage.read_url_ttl_secs)
    }
}
