use crate::domain::{FileResult, Job, JobId};
use async_trait::async_trait;

use super::RepositoryError;

/// Persistence for batch jobs.
///
/// Every mutating call is atomic with respect to a single job and is validated by the
/// domain transition rules on [`Job`], so concurrent writers cannot regress the status or
/// record two outcomes for one file.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError>;

    /// Moves a job from `PendingUpload` to `Processing` and returns the updated job.
    async fn begin_processing(&self, id: JobId) -> Result<Job, RepositoryError>;

    async fn record_result(
        &self,
        id: JobId,
        filename: &str,
        result: &FileResult,
    ) -> Result<(), RepositoryError>;

    async fn record_error(
        &self,
        id: JobId,
        filename: &str,
        error_message: &str,
    ) -> Result<(), RepositoryError>;

    async fn complete(&self, id: JobId) -> Result<(), RepositoryError>;

    async fn fail(&self, id: JobId, reason: &str) -> Result<(), RepositoryError>;
}
