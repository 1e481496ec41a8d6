//! Download job API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tubetap_core::{Job, JobError, JobStatus, OrchestratorError};

use super::ErrorResponse;
use crate::state::AppState;

/// Request body for submitting a download
#[derive(Debug, Deserialize)]
pub struct SubmitDownloadBody {
    /// Source URL to download.
    pub url: String,
    /// Optional output name override.
    pub custom_name: Option<String>,
}

/// Response for an accepted submission
#[derive(Debug, Serialize)]
pub struct SubmitDownloadResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Response for a deleted job
#[derive(Debug, Serialize)]
pub struct DeleteDownloadResponse {
    pub deleted: String,
}

/// Submit a URL for download.
///
/// Validation and admission failures are returned synchronously; anything
/// that happens after the job is accepted is observed by polling.
pub async fn submit_download(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitDownloadBody>,
) -> Result<Json<SubmitDownloadResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.orchestrator().submit(&body.url, body.custom_name) {
        Ok(job_id) => Ok(Json(SubmitDownloadResponse {
            job_id,
            status: JobStatus::Queued,
        })),
        Err(e @ OrchestratorError::InvalidUrl(_)) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(OrchestratorError::Store(e @ JobError::CapacityExceeded { .. })) => Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// List all jobs as a mapping of id to job record.
pub async fn list_downloads(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let mut map = serde_json::Map::new();
    for job in state.store().list() {
        if let Ok(value) = serde_json::to_value(&job) {
            map.insert(job.id, value);
        }
    }
    Json(serde_json::Value::Object(map))
}

/// Get a single job by id.
pub async fn get_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, (StatusCode, Json<ErrorResponse>)> {
    match state.store().get(&id) {
        Ok(job) => Ok(Json(job)),
        Err(e @ JobError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}

/// Delete a job, stopping its pipeline if still running.
pub async fn delete_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteDownloadResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store().delete(&id) {
        Ok(job) => {
            if job.status.is_active() {
                state.orchestrator().cancel(&id).await;
            }
            Ok(Json(DeleteDownloadResponse { deleted: id }))
        }
        Err(e @ JobError::NotFound(_)) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(e.to_string())),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )),
    }
}
