use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::application::ports::{
    JobRepository, RepositoryError, StagingStore, StagingStoreError, TemplateExtractor,
    TemplateExtractorError,
};
use crate::domain::{
    AiProvider, AudioFormat, FileResult, FileSpec, Job, JobId, JobStatus, JobTransitionError,
    StoragePath, TemplateType, format_analysis_items,
};

use super::file_task::FileTaskRunner;
use super::model_fallback_chain::ModelFallbackChain;
use super::prompts::PromptBundle;

pub const UNKNOWN_GROUP: &str = "Unknown Group";

#[derive(Debug, Clone)]
pub struct SubmitBatchRequest {
    pub frame: Vec<u8>,
    pub filenames: Vec<String>,
    /// Filename to group label. Filenames missing here get [`UNKNOWN_GROUP`].
    pub mapping: BTreeMap<String, String>,
    pub template_type: TemplateType,
    pub ai_provider: AiProvider,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedBatch {
    pub job_id: JobId,
    pub upload_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResults {
    pub job_id: JobId,
    pub results: BTreeMap<String, FileResult>,
    pub errors: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub upload_url_ttl: Duration,
    /// Files processed at once within one job. The rate limiter still gates every
    /// model call across jobs.
    pub max_concurrent_files: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            upload_url_ttl: Duration::from_secs(3600),
            max_concurrent_files: 1,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job {job_id} is not ready (status {status})")]
    NotReady { job_id: JobId, status: JobStatus },
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    #[error("repository error: {0}")]
    Repository(RepositoryError),
    #[error("storage error: {0}")]
    Storage(#[from] StagingStoreError),
    #[error("template error: {0}")]
    Template(#[from] TemplateExtractorError),
}

impl From<RepositoryError> for OrchestratorError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Transition(t @ JobTransitionError::InvalidTransition { .. }) => {
                OrchestratorError::InvalidTransition(t.to_string())
            }
            other => OrchestratorError::Repository(other),
        }
    }
}

/// Owns the batch job lifecycle: submission, the one-shot start, the background
/// per-file loop and the read accessors.
pub struct BatchOrchestrator {
    job_repository: Arc<dyn JobRepository>,
    staging_store: Arc<dyn StagingStore>,
    template_extractor: Arc<dyn TemplateExtractor>,
    file_task: Arc<FileTaskRunner>,
    chains: HashMap<AiProvider, Arc<ModelFallbackChain>>,
    settings: OrchestratorSettings,
}

impl BatchOrchestrator {
    pub fn new(
        job_repository: Arc<dyn JobRepository>,
        staging_store: Arc<dyn StagingStore>,
        template_extractor: Arc<dyn TemplateExtractor>,
        file_task: Arc<FileTaskRunner>,
        chains: Vec<Arc<ModelFallbackChain>>,
        settings: OrchestratorSettings,
    ) -> Self {
        let chains = chains
            .into_iter()
            .map(|chain| (chain.provider(), chain))
            .collect();
        Self {
            job_repository,
            staging_store,
            template_extractor,
            file_task,
            chains,
            settings,
        }
    }

    pub fn chain(&self, provider: AiProvider) -> Option<&Arc<ModelFallbackChain>> {
        self.chains.get(&provider)
    }

    /// Validates the request, issues one upload URL per file and stores the job in
    /// `PendingUpload`. Nothing is processed until [`start`](Self::start).
    #[tracing::instrument(
        skip(self, request),
        fields(files = request.filenames.len(), provider = %request.ai_provider)
    )]
    pub async fn submit(
        &self,
        request: SubmitBatchRequest,
    ) -> Result<SubmittedBatch, OrchestratorError> {
        validate_filenames(&request.filenames)?;
        validate_mapping(&request.filenames, &request.mapping)?;

        if !self.chains.contains_key(&request.ai_provider) {
            return Err(OrchestratorError::Validation(format!(
                "AI provider not configured: {}",
                request.ai_provider
            )));
        }

        let sections = self.template_extractor.extract_sections(&request.frame)?;
        let analysis_items = format_analysis_items(&sections);
        if analysis_items.is_empty() {
            return Err(TemplateExtractorError::Empty.into());
        }

        let job_id = JobId::new();
        let mut file_specs = BTreeMap::new();
        let mut upload_urls = BTreeMap::new();

        for filename in &request.filenames {
            let group = request
                .mapping
                .get(filename)
                .map(|g| g.trim().to_string())
                .unwrap_or_else(|| UNKNOWN_GROUP.to_string());
            let storage_path = StoragePath::for_upload(&job_id, filename);

            let url = self
                .staging_store
                .issue_write_url(&storage_path, self.settings.upload_url_ttl)
                .await?;

            upload_urls.insert(filename.clone(), url);
            file_specs.insert(filename.clone(), FileSpec::new(group, storage_path));
        }

        let job = Job::new(
            job_id,
            file_specs,
            analysis_items,
            request.template_type,
            request.ai_provider,
        );
        self.job_repository.create(&job).await?;

        tracing::info!(job_id = %job_id, items = job.analysis_items.len(), "Batch job created");

        Ok(SubmittedBatch {
            job_id,
            upload_urls,
        })
    }

    /// Moves the job to `Processing` and spawns its per-file loop. A second call for
    /// the same job fails with [`OrchestratorError::InvalidTransition`].
    #[tracing::instrument(skip(self), fields(job_id = %job_id))]
    pub async fn start(self: &Arc<Self>, job_id: JobId) -> Result<JoinHandle<()>, OrchestratorError> {
        let job = match self.job_repository.begin_processing(job_id).await {
            Ok(job) => job,
            Err(RepositoryError::NotFound(_)) => return Err(OrchestratorError::NotFound(job_id)),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(total_files = job.total_files, "Batch job started");

        let orchestrator = Arc::clone(self);
        let span = tracing::info_span!("batch_job", job_id = %job_id);
        Ok(tokio::spawn(
            async move { orchestrator.run_job(job).await }.instrument(span),
        ))
    }

    pub async fn status(&self, job_id: JobId) -> Result<Job, OrchestratorError> {
        self.job_repository
            .get_by_id(job_id)
            .await?
            .ok_or(OrchestratorError::NotFound(job_id))
    }

    pub async fn results(&self, job_id: JobId) -> Result<JobResults, OrchestratorError> {
        let job = self.status(job_id).await?;
        if job.status != JobStatus::Completed {
            return Err(OrchestratorError::NotReady {
                job_id,
                status: job.status,
            });
        }
        Ok(JobResults {
            job_id,
            results: job.results,
            errors: job.errors,
        })
    }

    async fn run_job(&self, job: Job) {
        let job_id = job.id;

        let outcome = match self.process_files(&job).await {
            Ok(()) => self.job_repository.complete(job_id).await.map_err(OrchestratorError::from),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => tracing::info!("Batch job completed"),
            Err(e) => {
                tracing::error!(error = %e, "Batch job failed");
                if let Err(fail_err) = self.job_repository.fail(job_id, &e.to_string()).await {
                    tracing::error!(error = %fail_err, "Failed to mark job as failed");
                }
            }
        }
    }

    async fn process_files(&self, job: &Job) -> Result<(), OrchestratorError> {
        let chain = self.chains.get(&job.ai_provider).cloned().ok_or_else(|| {
            OrchestratorError::Validation(format!("AI provider not configured: {}", job.ai_provider))
        })?;
        let bundle = Arc::new(PromptBundle::new(
            job.analysis_items.clone(),
            job.template_type,
        ));
        let concurrency = self.settings.max_concurrent_files.max(1);

        let mut outcomes = futures::stream::iter(job.file_specs.clone())
            .map(|(filename, spec)| {
                let file_task = Arc::clone(&self.file_task);
                let chain = Arc::clone(&chain);
                let bundle = Arc::clone(&bundle);
                async move {
                    let outcome = file_task.run(&filename, &spec, &chain, &bundle).await;
                    (filename, outcome)
                }
            })
            .buffer_unordered(concurrency);

        while let Some((filename, outcome)) = outcomes.next().await {
            match outcome {
                Ok(result) => {
                    self.job_repository
                        .record_result(job.id, &filename, &result)
                        .await?;
                    tracing::info!(filename = %filename, "File processed");
                }
                Err(e) => {
                    tracing::warn!(filename = %filename, error = %e, "File failed");
                    self.job_repository
                        .record_error(job.id, &filename, &e.to_string())
                        .await?;
                }
            }
        }

        Ok(())
    }
}

fn validate_filenames(filenames: &[String]) -> Result<(), OrchestratorError> {
    if filenames.is_empty() {
        return Err(OrchestratorError::Validation(
            "at least one audio file is required".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for filename in filenames {
        if filename.trim().is_empty() {
            return Err(OrchestratorError::Validation("empty filename".to_string()));
        }
        if filename.contains(['/', '\\']) || filename.contains("..") {
            return Err(OrchestratorError::Validation(format!(
                "filename must not contain path components: {}",
                filename
            )));
        }
        if AudioFormat::from_filename(filename).is_none() {
            return Err(OrchestratorError::Validation(format!(
                "unsupported audio file type: {} (allowed: {})",
                filename,
                AudioFormat::SUPPORTED_EXTENSIONS.join(", ")
            )));
        }
        if !seen.insert(filename.as_str()) {
            return Err(OrchestratorError::Validation(format!(
                "duplicate filename: {}",
                filename
            )));
        }
    }
    Ok(())
}

fn validate_mapping(
    filenames: &[String],
    mapping: &BTreeMap<String, String>,
) -> Result<(), OrchestratorError> {
    for (filename, group) in mapping {
        if !filenames.iter().any(|f| f == filename) {
            return Err(OrchestratorError::Validation(format!(
                "mapping refers to unknown file: {}",
                filename
            )));
        }
        if group.trim().is_empty() {
            return Err(OrchestratorError::Validation(format!(
                "empty group label for file: {}",
                filename
            )));
        }
    }
    Ok(())
}
