use std::io;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::application::ports::StagingStoreError;
use crate::application::services::OrchestratorError;
use crate::domain::{AudioFormat, JobId, JobStatus, StoragePath};
use crate::infrastructure::storage::LocalStagingStore;
use crate::presentation::state::AppState;

use super::error::error_response;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub expires: i64,
}

fn authorize(state: &AppState, path: &str, query: &UploadQuery) -> Result<StoragePath, Response> {
    if state.local_store.is_none() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Uploads are not served by this instance",
        ));
    }
    if !path.starts_with("batch/") || path.split('/').any(|segment| segment == "..") {
        return Err(error_response(StatusCode::BAD_REQUEST, "Invalid upload path"));
    }
    if LocalStagingStore::is_expired(query.expires) {
        return Err(error_response(StatusCode::FORBIDDEN, "Upload URL expired"));
    }
    Ok(StoragePath::from_raw(path))
}

/// Writes are accepted only for files declared by a job that is still waiting for uploads.
async fn admit_upload(state: &AppState, path: &str) -> Result<(), Response> {
    let not_declared = || error_response(StatusCode::NOT_FOUND, format!("Unknown upload: {}", path));
    let mut segments = path.splitn(3, '/').skip(1);
    let (Some(job_segment), Some(filename)) = (segments.next(), segments.next()) else {
        return Err(not_declared());
    };
    let job_id = Uuid::parse_str(job_segment)
        .map(JobId::from_uuid)
        .map_err(|_| not_declared())?;

    let job = match state.orchestrator.status(job_id).await {
        Ok(job) => job,
        Err(OrchestratorError::NotFound(_)) => return Err(not_declared()),
        Err(e) => {
            tracing::error!(error = %e, "Upload admission lookup failed");
            return Err(error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
        }
    };
    if !job.file_specs.contains_key(filename) {
        return Err(not_declared());
    }
    if job.status != JobStatus::PendingUpload {
        return Err(error_response(
            StatusCode::CONFLICT,
            "Job is no longer accepting uploads",
        ));
    }
    Ok(())
}

#[tracing::instrument(skip(state, query, body))]
pub async fn upload_put_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<UploadQuery>,
    body: Body,
) -> Response {
    let storage_path = match authorize(&state, &path, &query) {
        Ok(p) => p,
        Err(response) => return response,
    };
    if let Err(response) = admit_upload(&state, &path).await {
        return response;
    }
    let Some(store) = state.local_store.as_ref() else {
        return error_response(StatusCode::NOT_FOUND, "Uploads are not served by this instance");
    };

    let stream = body.into_data_stream().map_err(io::Error::other).boxed();

    match store.store(&storage_path, stream).await {
        Ok(bytes) => {
            tracing::info!(path = %storage_path, bytes, "Upload stored");
            StatusCode::CREATED.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Upload failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[tracing::instrument(skip(state, query))]
pub async fn upload_get_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<UploadQuery>,
) -> Response {
    let storage_path = match authorize(&state, &path, &query) {
        Ok(p) => p,
        Err(response) => return response,
    };
    let Some(store) = state.local_store.as_ref() else {
        return error_response(StatusCode::NOT_FOUND, "Uploads are not served by this instance");
    };

    match store.fetch(&storage_path).await {
        Ok(bytes) => {
            let mime = AudioFormat::from_filename(storage_path.as_str())
                .map(|f| f.as_mime())
                .unwrap_or("application/octet-stream");
            ([(header::CONTENT_TYPE, mime)], Body::from(bytes)).into_response()
        }
        Err(StagingStoreError::NotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, format!("Not found: {}", storage_path))
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
