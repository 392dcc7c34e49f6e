use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{AiProvider, FileResult, FileSpec, JobId, JobStatus, TemplateType};

/// A batch of audio files sharing one report template and one AI provider.
///
/// All mutation goes through the transition methods below so that the status never
/// regresses, `processed_files` only counts recorded outcomes, and a filename lands in
/// exactly one of `results` or `errors`.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub message: String,
    pub total_files: usize,
    pub processed_files: usize,
    pub file_specs: BTreeMap<String, FileSpec>,
    pub analysis_items: Vec<String>,
    pub template_type: TemplateType,
    pub ai_provider: AiProvider,
    pub results: BTreeMap<String, FileResult>,
    pub errors: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(
        id: JobId,
        file_specs: BTreeMap<String, FileSpec>,
        analysis_items: Vec<String>,
        template_type: TemplateType,
        ai_provider: AiProvider,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::PendingUpload,
            message: "Waiting for audio uploads".to_string(),
            total_files: file_specs.len(),
            processed_files: 0,
            file_specs,
            analysis_items,
            template_type,
            ai_provider,
            results: BTreeMap::new(),
            errors: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn begin_processing(&mut self) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Processing)?;
        self.message = "Batch analysis in progress".to_string();
        Ok(())
    }

    pub fn record_result(
        &mut self,
        filename: &str,
        result: FileResult,
    ) -> Result<(), JobTransitionError> {
        self.ensure_outcome_slot(filename)?;
        self.results.insert(filename.to_string(), result);
        self.mark_processed();
        Ok(())
    }

    pub fn record_error(
        &mut self,
        filename: &str,
        error_message: impl Into<String>,
    ) -> Result<(), JobTransitionError> {
        self.ensure_outcome_slot(filename)?;
        self.errors.insert(filename.to_string(), error_message.into());
        self.mark_processed();
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Completed)?;
        self.message = format!(
            "Batch analysis completed: {} succeeded, {} failed",
            self.results.len(),
            self.errors.len()
        );
        Ok(())
    }

    pub fn fail(&mut self, reason: &str) -> Result<(), JobTransitionError> {
        self.transition(JobStatus::Failed)?;
        self.message = format!("Batch analysis failed: {}", reason);
        Ok(())
    }

    pub fn is_settled(&self) -> bool {
        self.processed_files == self.total_files
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobTransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(JobTransitionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn ensure_outcome_slot(&self, filename: &str) -> Result<(), JobTransitionError> {
        if self.status != JobStatus::Processing {
            return Err(JobTransitionError::NotProcessing(self.status));
        }
        if !self.file_specs.contains_key(filename) {
            return Err(JobTransitionError::UnknownFile(filename.to_string()));
        }
        if self.results.contains_key(filename) || self.errors.contains_key(filename) {
            return Err(JobTransitionError::OutcomeAlreadyRecorded(filename.to_string()));
        }
        Ok(())
    }

    fn mark_processed(&mut self) {
        self.processed_files = (self.processed_files + 1).min(self.total_files);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobTransitionError {
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
    #[error("job is not processing (status {0})")]
    NotProcessing(JobStatus),
    #[error("file is not part of this job: {0}")]
    UnknownFile(String),
    #[error("outcome already recorded for file: {0}")]
    OutcomeAlreadyRecorded(String),
}
