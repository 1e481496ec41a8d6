use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{downloads, files, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Dashboard static files path (configurable via env)
    let dashboard_dir =
        std::env::var("DASHBOARD_DIR").unwrap_or_else(|_| "dashboard/dist".to_string());

    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/config", post(handlers::update_config))
        // Download jobs
        .route("/download", post(downloads::submit_download))
        .route("/downloads", get(downloads::list_downloads))
        .route("/downloads/{id}", get(downloads::get_download))
        .route("/downloads/{id}", delete(downloads::delete_download))
        // Output library
        .route("/files", get(files::list_files))
        .route("/play/{*path}", get(files::play_file))
        .route("/download-file/{*path}", get(files::fetch_file))
        // Metrics
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    // Serve dashboard with SPA fallback
    let index_path = format!("{}/index.html", dashboard_dir);
    let serve_dir = ServeDir::new(&dashboard_dir).fallback(ServeFile::new(&index_path));

    Router::new()
        .merge(api_routes)
        .fallback_service(serve_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
