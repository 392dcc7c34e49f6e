mod job_repository;
mod llm_client;
mod repository_error;
mod staging_store;
mod template_extractor;
mod transcription_provider;

pub use job_repository::JobRepository;
pub use llm_client::{Completion, CompletionStatus, LlmClient, LlmClientError};
pub use repository_error::RepositoryError;
pub use staging_store::{StagingStore, StagingStoreError};
pub use template_extractor::{TemplateExtractor, TemplateExtractorError};
pub use transcription_provider::{
    TranscriptionError, TranscriptionPoll, TranscriptionProvider, TranscriptionRequest,
    TranscriptionState,
};
