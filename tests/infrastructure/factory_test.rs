use bomatic::application::ports::{LlmClientError, StagingStoreError, TranscriptionError};
use bomatic::domain::AiProvider;
use bomatic::infrastructure::audio::TranscriptionProviderFactory;
use bomatic::infrastructure::llm::LlmClientFactory;
use bomatic::infrastructure::storage::StagingStoreFactory;
use bomatic::presentation::config::{
    StorageProviderSetting, StorageSettings, TranscriptionSettings,
};

#[test]
fn given_no_api_key_when_creating_llm_client_then_not_configured() {
    for provider in [AiProvider::OpenAi, AiProvider::Gemini] {
        let result = LlmClientFactory::create(provider, None, None, 1024, 0.1);
        assert!(matches!(result, Err(LlmClientError::NotConfigured(_))));
    }
}

#[test]
fn given_blank_api_key_when_creating_llm_client_then_not_configured() {
    let result = LlmClientFactory::create(AiProvider::Gemini, Some("  ".to_string()), None, 1024, 0.1);

    assert!(matches!(result, Err(LlmClientError::NotConfigured(_))));
}

#[test]
fn given_api_key_when_creating_llm_client_then_succeeds() {
    let result = LlmClientFactory::create(AiProvider::OpenAi, Some("sk-test".to_string()), None, 1024, 0.1);

    assert!(result.is_ok());
}

#[test]
fn given_no_daglo_key_when_creating_transcription_provider_then_not_configured() {
    let result = TranscriptionProviderFactory::create(&TranscriptionSettings::default());

    assert!(matches!(result, Err(TranscriptionError::NotConfigured(_))));
}

#[test]
fn given_daglo_key_when_creating_transcription_provider_then_succeeds() {
    let settings = TranscriptionSettings {
        api_key: Some("daglo-key".to_string()),
        ..TranscriptionSettings::default()
    };

    assert!(TranscriptionProviderFactory::create(&settings).is_ok());
}

#[test]
fn given_local_provider_when_creating_store_then_local_store_is_exposed() {
    let dir = tempfile::TempDir::new().unwrap();
    let settings = StorageSettings {
        local_path: dir.path().join("uploads").to_string_lossy().into_owned(),
        ..StorageSettings::default()
    };

    let stores = StagingStoreFactory::create(&settings, "http://localhost:3000").unwrap();

    assert!(stores.local.is_some());
    assert!(dir.path().join("uploads").is_dir());
}

#[test]
fn given_azure_provider_without_account_when_creating_store_then_not_configured() {
    let settings = StorageSettings {
        provider: StorageProviderSetting::Azure,
        ..StorageSettings::default()
    };

    let result = StagingStoreFactory::create(&settings, "http://localhost:3000");

    assert!(matches!(result, Err(StagingStoreError::NotConfigured(_))));
}

#[test]
fn given_gcs_provider_without_bucket_when_creating_store_then_not_configured() {
    let settings = StorageSettings {
        provider: StorageProviderSetting::Gcs,
        ..StorageSettings::default()
    };

    let result = StagingStoreFactory::create(&settings, "http://localhost:3000");

    assert!(matches!(result, Err(StagingStoreError::NotConfigured(_))));
}
