use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use bomatic::application::ports::JobRepository;
use bomatic::application::services::{
    BatchOrchestrator, FileTaskRunner, ModelFallbackChain, ModelStatsRegistry, RateLimiter,
    TranscriptionService,
};
use bomatic::domain::AiProvider;
use bomatic::infrastructure::audio::TranscriptionProviderFactory;
use bomatic::infrastructure::llm::LlmClientFactory;
use bomatic::infrastructure::observability::{TracingConfig, init_tracing};
use bomatic::infrastructure::persistence::{InMemoryJobRepository, PgJobRepository, create_pool};
use bomatic::infrastructure::storage::StagingStoreFactory;
use bomatic::infrastructure::template::PlainTextTemplateExtractor;
use bomatic::presentation::config::JobStoreProvider;
use bomatic::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load configuration")?;

    let json_format = settings.logging.enable_json || environment == Environment::Prod;
    init_tracing(
        &TracingConfig::new(environment.as_str(), json_format)
            .with_default_filter(settings.logging.level.clone()),
    );

    let stores =
        StagingStoreFactory::create(&settings.storage, &settings.server.public_base_url)
            .context("Failed to create staging store")?;

    let job_repository = build_job_repository(&settings).await?;

    let rate_limiter = Arc::new(RateLimiter::with_models(
        settings.rate_limits.default.into(),
        settings.rate_limits.model_limits(),
    ));
    let model_stats = Arc::new(ModelStatsRegistry::new());

    let mut chains = Vec::new();
    for provider in [AiProvider::OpenAi, AiProvider::Gemini] {
        let provider_settings = settings.llm.provider(provider);
        match LlmClientFactory::create(
            provider,
            provider_settings.api_key.clone(),
            provider_settings.base_url.clone(),
            settings.llm.max_output_tokens,
            settings.llm.temperature,
        ) {
            Ok(client) => {
                let chain_settings = settings.chain_settings(provider);
                tracing::info!(%provider, models = ?chain_settings.models, "Analysis provider enabled");
                chains.push(Arc::new(ModelFallbackChain::new(
                    provider,
                    client,
                    Arc::clone(&rate_limiter),
                    Arc::clone(&model_stats),
                    settings.splitter.splitter(),
                    chain_settings,
                )));
            }
            Err(e) => {
                tracing::warn!(%provider, error = %e, "Analysis provider disabled");
            }
        }
    }

    let transcription_provider = TranscriptionProviderFactory::create(&settings.transcription)
        .context("Failed to create transcription provider")?;
    let transcription = Arc::new(TranscriptionService::new(
        transcription_provider,
        settings.transcription.polling(),
        settings.retry.transcription_policy(),
    ));

    let file_task = Arc::new(FileTaskRunner::new(
        Arc::clone(&stores.staging),
        transcription,
        settings.read_url_ttl(),
    ));

    let orchestrator = Arc::new(BatchOrchestrator::new(
        job_repository,
        Arc::clone(&stores.staging),
        Arc::new(PlainTextTemplateExtractor),
        file_task,
        chains,
        settings.orchestrator_settings(),
    ));

    let state = AppState {
        orchestrator,
        model_stats,
        rate_limiter,
        local_store: stores.local,
    };

    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, %environment, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn build_job_repository(settings: &Settings) -> anyhow::Result<Arc<dyn JobRepository>> {
    match settings.job_store.provider {
        JobStoreProvider::Memory => {
            tracing::info!("Using in-memory job store");
            Ok(Arc::new(InMemoryJobRepository::new()))
        }
        JobStoreProvider::Postgres => {
            let url = settings
                .job_store
                .database_url
                .as_deref()
                .context("job_store.database_url is required for the postgres job store")?;
            let pool = create_pool(url, settings.job_store.max_connections).await?;
            let repository = PgJobRepository::new(pool);
            repository.run_migrations().await?;
            tracing::info!("Using postgres job store");
            Ok(Arc::new(repository))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
