use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tubetap_core::{validate_downloads, Config};

use super::ErrorResponse;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.current_config())
}

/// Partial update of the downloads section; unset fields keep their current
/// value.
#[derive(Debug, Deserialize)]
pub struct ConfigUpdateBody {
    pub download_path: Option<PathBuf>,
    pub max_concurrent_downloads: Option<usize>,
    pub organize_by_date: Option<bool>,
}

pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConfigUpdateBody>,
) -> Result<Json<Config>, (StatusCode, Json<ErrorResponse>)> {
    let mut downloads = state.downloads_config();

    if let Some(path) = body.download_path {
        downloads.download_path = path;
    }
    if let Some(max) = body.max_concurrent_downloads {
        downloads.max_concurrent_downloads = max;
    }
    if let Some(by_date) = body.organize_by_date {
        downloads.organize_by_date = by_date;
    }

    if let Err(e) = validate_downloads(&downloads) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(e.to_string())),
        ));
    }

    state.set_downloads_config(downloads);
    Ok(Json(state.current_config()))
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render(),
    )
}
