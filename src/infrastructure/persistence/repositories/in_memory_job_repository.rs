use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{FileResult, Job, JobId, JobTransitionError};

/// Process-local job store. Each mutation runs under the write lock, so the domain
/// transition check and the update are one atomic step. Transitions validate before
/// touching the job, so a rejected one leaves it unchanged.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    async fn mutate<F>(&self, id: JobId, apply: F) -> Result<Job, RepositoryError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobTransitionError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;

        apply(job)?;
        Ok(job.clone())
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "job already exists: {}",
                job.id
            )));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn begin_processing(&self, id: JobId) -> Result<Job, RepositoryError> {
        self.mutate(id, Job::begin_processing).await
    }

    async fn record_result(
        &self,
        id: JobId,
        filename: &str,
        result: &FileResult,
    ) -> Result<(), RepositoryError> {
        self.mutate(id, |job| job.record_result(filename, result.clone()))
            .await
            .map(|_| ())
    }

    async fn record_error(
        &self,
        id: JobId,
        filename: &str,
        error_message: &str,
    ) -> Result<(), RepositoryError> {
        self.mutate(id, |job| job.record_error(filename, error_message))
            .await
            .map(|_| ())
    }

    async fn complete(&self, id: JobId) -> Result<(), RepositoryError> {
        self.mutate(id, Job::complete).await.map(|_| ())
    }

    async fn fail(&self, id: JobId, reason: &str) -> Result<(), RepositoryError> {
        self.mutate(id, |job| job.fail(reason)).await.map(|_| ())
    }
}
