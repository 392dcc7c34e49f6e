use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::SubmitBatchRequest;
use crate::domain::{AiProvider, JobId, JobStatus, TemplateType};
use crate::presentation::state::AppState;

use super::error::{ApiError, error_response};

#[derive(Serialize)]
pub struct SubmitBatchResponse {
    pub job_id: String,
    pub upload_urls: BTreeMap<String, String>,
    pub message: String,
}

#[derive(Serialize)]
pub struct StartBatchResponse {
    pub job_id: String,
    pub status: String,
    pub message: String,
}

pub(super) fn parse_job_id(raw: &str) -> Result<JobId, Response> {
    Uuid::parse_str(raw).map(JobId::from_uuid).map_err(|_| {
        error_response(StatusCode::BAD_REQUEST, format!("Invalid job ID: {}", raw))
    })
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

/// Multipart fields: `frame` (file), `filenames` (repeated, or one comma-separated
/// value), `mapping` (JSON object filename to group), `template_type`, `ai_provider`.
async fn read_submission(mut multipart: Multipart) -> Result<SubmitBatchRequest, Response> {
    let mut frame: Option<Vec<u8>> = None;
    let mut filenames: Vec<String> = Vec::new();
    let mut mapping: BTreeMap<String, String> = BTreeMap::new();
    let mut template_type = TemplateType::default();
    let mut ai_provider = AiProvider::OpenAi;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bad_request(format!("Failed to read multipart: {}", e))),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "frame" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read frame: {}", e)))?;
                frame = Some(bytes.to_vec());
            }
            "filenames" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read filenames: {}", e)))?;
                filenames.extend(
                    text.split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(String::from),
                );
            }
            "mapping" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read mapping: {}", e)))?;
                if !text.trim().is_empty() {
                    mapping = serde_json::from_str(&text)
                        .map_err(|e| bad_request(format!("Malformed mapping JSON: {}", e)))?;
                }
            }
            "template_type" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                template_type = text.parse().map_err(bad_request)?;
            }
            "ai_provider" => {
                let text = field.text().await.map_err(|e| bad_request(e.to_string()))?;
                ai_provider = text.parse().map_err(bad_request)?;
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let frame = frame.ok_or_else(|| bad_request("Missing frame document"))?;

    Ok(SubmitBatchRequest {
        frame,
        filenames,
        mapping,
        template_type,
        ai_provider,
    })
}

#[tracing::instrument(skip(state, multipart))]
pub async fn submit_batch_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let request = match read_submission(multipart).await {
        Ok(request) => request,
        Err(response) => return response,
    };

    match state.orchestrator.submit(request).await {
        Ok(submitted) => (
            StatusCode::CREATED,
            Json(SubmitBatchResponse {
                job_id: submitted.job_id.to_string(),
                message: format!(
                    "Upload {} file(s) to the given URLs, then start the job",
                    submitted.upload_urls.len()
                ),
                upload_urls: submitted.upload_urls,
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn start_batch_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id = match parse_job_id(&job_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.orchestrator.start(job_id).await {
        Ok(_handle) => (
            StatusCode::ACCEPTED,
            Json(StartBatchResponse {
                job_id: job_id.to_string(),
                status: JobStatus::Processing.as_str().to_string(),
                message: "Batch analysis started".to_string(),
            }),
        )
            .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}
