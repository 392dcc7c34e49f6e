use std::time::Duration;

use bomatic::domain::AiProvider;
use bomatic::presentation::config::{JobStoreProvider, Settings, StorageProviderSetting};
use bomatic::presentation::Environment;

#[test]
fn given_default_settings_when_inspecting_then_local_memory_setup() {
    let settings = Settings::default();

    assert_eq!(settings.storage.provider, StorageProviderSetting::Local);
    assert_eq!(settings.job_store.provider, JobStoreProvider::Memory);
    assert_eq!(settings.transcription.language, "ko-KR");
    assert_eq!(settings.batch.max_concurrent_files, 1);
}

#[test]
fn given_default_settings_when_building_chain_settings_then_models_in_fallback_order() {
    let settings = Settings::default();

    let openai = settings.chain_settings(AiProvider::OpenAi);
    let gemini = settings.chain_settings(AiProvider::Gemini);

    assert_eq!(openai.models, vec!["gpt-5".to_string(), "gpt-4o".to_string()]);
    assert_eq!(gemini.models[0], "gemini-2.5-pro");
    assert_eq!(openai.call_policy.max_attempts, 5);
    assert_eq!(openai.chain_policy.max_attempts, 2);
    assert_eq!(openai.max_input_tokens, 28_000);
}

#[test]
fn given_default_settings_when_deriving_timings_then_match_storage_and_polling() {
    let settings = Settings::default();

    let polling = settings.transcription.polling();
    let orchestrator = settings.orchestrator_settings();

    assert_eq!(polling.poll_interval, Duration::from_secs(2));
    assert_eq!(polling.max_poll_attempts, 150);
    assert_eq!(orchestrator.upload_url_ttl, Duration::from_secs(3600));
    assert_eq!(settings.read_url_ttl(), Duration::from_secs(7200));
}

#[test]
fn given_zero_concurrency_when_deriving_orchestrator_settings_then_clamped_to_one() {
    let mut settings = Settings::default();
    settings.batch.max_concurrent_files = 0;

    assert_eq!(settings.orchestrator_settings().max_concurrent_files, 1);
}

#[test]
fn given_default_rate_limits_when_listing_then_every_default_model_has_limits() {
    let settings = Settings::default();

    let models: Vec<String> = settings
        .rate_limits
        .model_limits()
        .into_iter()
        .map(|(model, _)| model)
        .collect();

    for model in ["gpt-5", "gpt-4o", "gemini-2.5-pro", "gemini-2.5-flash"] {
        assert!(models.iter().any(|m| m == model), "{}", model);
    }
}

#[test]
fn given_environment_names_when_parsing_then_known_values_accepted() {
    assert_eq!(Environment::try_from("prod".to_string()), Ok(Environment::Prod));
    assert_eq!(
        Environment::try_from("Production".to_string()),
        Ok(Environment::Prod)
    );
    assert_eq!(Environment::try_from("test".to_string()), Ok(Environment::Test));
    assert!(Environment::try_from("staging".to_string()).is_err());
}
