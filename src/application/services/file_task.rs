use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{StagingStore, StagingStoreError, TranscriptionError};
use crate::domain::{FileResult, FileSpec};

use super::model_fallback_chain::ModelFallbackChain;
use super::prompts::PromptBundle;
use super::transcription_service::TranscriptionService;

#[derive(Debug, thiserror::Error)]
pub enum FileTaskError {
    #[error("audio not uploaded: {0}")]
    MissingUpload(String),
    #[error("storage error: {0}")]
    Storage(#[from] StagingStoreError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}

/// Transcribes and analyzes a single uploaded file.
///
/// Storage and transcription failures are returned as errors. Analysis never fails:
/// the fallback chain degrades to a fallback notice instead.
pub struct FileTaskRunner {
    staging_store: Arc<dyn StagingStore>,
    transcription: Arc<TranscriptionService>,
    read_url_ttl: Duration,
}

impl FileTaskRunner {
    pub fn new(
        staging_store: Arc<dyn StagingStore>,
        transcription: Arc<TranscriptionService>,
        read_url_ttl: Duration,
    ) -> Self {
        Self {
            staging_store,
            transcription,
            read_url_ttl,
        }
    }

    #[tracing::instrument(
        name = "file_task",
        skip(self, spec, chain, bundle),
        fields(group = %spec.group, storage_path = %spec.storage_path)
    )]
    pub async fn run(
        &self,
        filename: &str,
        spec: &FileSpec,
        chain: &ModelFallbackChain,
        bundle: &PromptBundle,
    ) -> Result<FileResult, FileTaskError> {
        if !self.staging_store.exists(&spec.storage_path).await? {
            return Err(FileTaskError::MissingUpload(filename.to_string()));
        }

        let audio_url = self
            .staging_store
            .issue_read_url(&spec.storage_path, self.read_url_ttl)
            .await?
            .ok_or_else(|| FileTaskError::MissingUpload(filename.to_string()))?;

        let transcript = self.transcription.transcribe(&audio_url).await?;

        let outcome = chain.analyze(&transcript, bundle).await;
        if outcome.is_degraded() {
            tracing::warn!("Analysis degraded to fallback response");
        }

        Ok(FileResult::new(
            spec.group.clone(),
            transcript,
            outcome.into_text(),
        ))
    }
}
