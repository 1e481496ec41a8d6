//! Output library handlers: listing, playback and fetch.

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tubetap_core::{resolve_library_path, scan_library, LibraryFile};

use super::ErrorResponse;
use crate::state::AppState;

/// List files in the output library, newest first.
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LibraryFile>>, (StatusCode, Json<ErrorResponse>)> {
    let downloads = state.downloads_config();
    match scan_library(&downloads.download_path, state.library_extension()).await {
        Ok(files) => Ok(Json(files)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(format!("failed to scan library: {}", e))),
        )),
    }
}

/// Stream a library file for in-browser playback.
pub async fn play_file(
    State(state): State<Arc<AppState>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    stream_file(&state, &path, false).await
}

/// Stream a library file with a download disposition.
pub async fn fetch_file(
    State(state): State<Arc<AppState>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    stream_file(&state, &path, true).await
}

async fn stream_file(state: &AppState, relative: &str, attachment: bool) -> Response {
    let downloads = state.downloads_config();

    let Some(full_path) = resolve_library_path(&downloads.download_path, relative) else {
        return not_found(relative);
    };

    let file = match tokio::fs::File::open(&full_path).await {
        Ok(file) => file,
        Err(_) => return not_found(relative),
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&full_path));

    if attachment {
        let file_name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "download".to_string());
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        );
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") | Some("opus") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    }
}

fn not_found(relative: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("File not found: {}", relative))),
    )
        .into_response()
}
