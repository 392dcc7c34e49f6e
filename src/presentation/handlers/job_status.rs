use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::{FileResult, Job};
use crate::presentation::state::AppState;

use super::batch::parse_job_id;
use super::error::ApiError;

#[derive(Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: String,
    pub message: String,
    pub total_files: usize,
    pub processed_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: BTreeMap<String, String>,
    pub template_type: String,
    pub ai_provider: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status.as_str().to_string(),
            message: job.message,
            total_files: job.total_files,
            processed_files: job.processed_files,
            succeeded: job.results.len(),
            failed: job.errors.len(),
            errors: job.errors,
            template_type: job.template_type.as_str().to_string(),
            ai_provider: job.ai_provider.as_str().to_string(),
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct JobResultsResponse {
    pub job_id: String,
    pub results: BTreeMap<String, FileResult>,
    pub errors: BTreeMap<String, String>,
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.orchestrator.status(job_id).await {
        Ok(job) => (StatusCode::OK, Json(JobStatusResponse::from(job))).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn job_results_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.orchestrator.results(job_id).await {
        Ok(results) => (
            StatusCode::OK,
            Json(JobResultsResponse {
                job_id: results.job_id.to_string(),
                results: results.results,
                errors: results.errors,
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
