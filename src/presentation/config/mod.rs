mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    BatchSettings, JobStoreProvider, JobStoreSettings, LlmSettings, LoggingSettings,
    ModelLimitSetting, ProviderSettings, RateLimitSettings, RetrySettings, ServerSettings,
    Settings, SplitterSettings, StorageProviderSetting, StorageSettings,
    TranscriptionProviderSetting, TranscriptionSettings,
};
