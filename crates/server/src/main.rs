use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubetap_core::{
    load_config, validate_config, Downloader, JobStore, MemoryJobStore, YtDlpDownloader,
};
use tubetap_server::api::create_router;
use tubetap_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TUBETAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Download directory: {:?}", config.downloads.download_path);
    info!(
        "Max concurrent downloads: {}",
        config.downloads.max_concurrent_downloads
    );

    tokio::fs::create_dir_all(&config.downloads.download_path)
        .await
        .with_context(|| {
            format!(
                "Failed to create download directory {:?}",
                config.downloads.download_path
            )
        })?;

    // Create job store
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new(
        config.downloads.max_concurrent_downloads,
    ));

    // Create downloader. A missing yt-dlp does not prevent startup;
    // submissions fail until it is installed.
    let downloader: Arc<dyn Downloader> = Arc::new(YtDlpDownloader::new(config.downloader.clone()));
    match downloader.validate().await {
        Ok(()) => info!("Downloader validated: {}", downloader.name()),
        Err(e) => warn!("Downloader validation failed: {}", e),
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), store, downloader));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
