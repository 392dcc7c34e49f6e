use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{JobRepository, RepositoryError};
use crate::domain::{FileResult, FileSpec, Job, JobId, JobTransitionError};

const SELECT_COLUMNS: &str = r#"
    SELECT id, status, message, total_files, processed_files, file_specs, analysis_items,
           template_type, ai_provider, results, errors, created_at, updated_at
    FROM batch_jobs
"#;

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    status: String,
    message: String,
    total_files: i32,
    processed_files: i32,
    file_specs: Json<BTreeMap<String, FileSpec>>,
    analysis_items: Json<Vec<String>>,
    template_type: String,
    ai_provider: String,
    results: Json<BTreeMap<String, FileResult>>,
    errors: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for Job {
    type Error = RepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        Ok(Job {
            id: JobId::from_uuid(row.id),
            status: row.status.parse().map_err(RepositoryError::QueryFailed)?,
            message: row.message,
            total_files: to_count(row.total_files)?,
            processed_files: to_count(row.processed_files)?,
            file_specs: row.file_specs.0,
            analysis_items: row.analysis_items.0,
            template_type: row.template_type.parse().map_err(RepositoryError::QueryFailed)?,
            ai_provider: row.ai_provider.parse().map_err(RepositoryError::QueryFailed)?,
            results: row.results.0,
            errors: row.errors.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn to_count(value: i32) -> Result<usize, RepositoryError> {
    usize::try_from(value)
        .map_err(|_| RepositoryError::QueryFailed(format!("negative file count: {}", value)))
}

fn to_column(value: usize) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::ConstraintViolation(format!("file count too large: {}", value)))
}

fn query_failed(e: sqlx::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

/// Jobs as one row each, with file specs, results and errors in JSONB columns.
///
/// Mutations lock the row (`SELECT ... FOR UPDATE`), apply the domain transition and
/// write the whole row back in the same transaction.
pub struct PgJobRepository {
    pool: PgPool,
}

impl PgJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))
    }

    async fn mutate<F>(&self, id: JobId, apply: F) -> Result<Job, RepositoryError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobTransitionError> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(query_failed)?;

        let row: Option<JobRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_failed)?;

        let mut job: Job = row
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?
            .try_into()?;

        apply(&mut job)?;
        write_back(&mut tx, &job).await?;

        tx.commit().await.map_err(query_failed)?;
        Ok(job)
    }
}

async fn write_back(tx: &mut Transaction<'_, Postgres>, job: &Job) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        UPDATE batch_jobs
        SET status = $1, message = $2, processed_files = $3, results = $4, errors = $5,
            updated_at = $6
        WHERE id = $7
        "#,
    )
    .bind(job.status.as_str())
    .bind(&job.message)
    .bind(to_column(job.processed_files)?)
    .bind(Json(&job.results))
    .bind(Json(&job.errors))
    .bind(job.updated_at)
    .bind(job.id.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(query_failed)?;
    Ok(())
}

#[async_trait]
impl JobRepository for PgJobRepository {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create(&self, job: &Job) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO batch_jobs (id, status, message, total_files, processed_files, file_specs,
                                    analysis_items, template_type, ai_provider, results, errors,
                                    created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.status.as_str())
        .bind(&job.message)
        .bind(to_column(job.total_files)?)
        .bind(to_column(job.processed_files)?)
        .bind(Json(&job.file_specs))
        .bind(Json(&job.analysis_items))
        .bind(job.template_type.as_str())
        .bind(job.ai_provider.as_str())
        .bind(Json(&job.results))
        .bind(Json(&job.errors))
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db.to_string())
            }
            other => query_failed(other),
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_by_id(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let row: Option<JobRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.map(Job::try_from).transpose()
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn begin_processing(&self, id: JobId) -> Result<Job, RepositoryError> {
        self.mutate(id, Job::begin_processing).await
    }

    #[instrument(skip(self, result), fields(job_id = %id))]
    async fn record_result(
        &self,
        id: JobId,
        filename: &str,
        result: &FileResult,
    ) -> Result<(), RepositoryError> {
        let result = result.clone();
        self.mutate(id, move |job| job.record_result(filename, result))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn record_error(
        &self,
        id: JobId,
        filename: &str,
        error_message: &str,
    ) -> Result<(), RepositoryError> {
        self.mutate(id, move |job| job.record_error(filename, error_message))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn complete(&self, id: JobId) -> Result<(), RepositoryError> {
        self.mutate(id, Job::complete).await.map(|_| ())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn fail(&self, id: JobId, reason: &str) -> Result<(), RepositoryError> {
        self.mutate(id, move |job| job.fail(reason)).await.map(|_| ())
    }
}
