use std::sync::{Arc, RwLock};

use tubetap_core::{Config, DownloadOrchestrator, Downloader, DownloadsConfig, JobStore};

/// Shared application state
pub struct AppState {
    config: Config,
    downloads: Arc<RwLock<DownloadsConfig>>,
    store: Arc<dyn JobStore>,
    orchestrator: DownloadOrchestrator,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn JobStore>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        let downloads = Arc::new(RwLock::new(config.downloads.clone()));
        let orchestrator =
            DownloadOrchestrator::new(Arc::clone(&store), downloader, Arc::clone(&downloads));

        Self {
            config,
            downloads,
            store,
            orchestrator,
        }
    }

    pub fn store(&self) -> &dyn JobStore {
        self.store.as_ref()
    }

    pub fn orchestrator(&self) -> &DownloadOrchestrator {
        &self.orchestrator
    }

    /// Snapshot of the runtime-mutable downloads section.
    pub fn downloads_config(&self) -> DownloadsConfig {
        self.downloads
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the downloads section and propagate the new admission ceiling
    /// to the store. In-flight jobs keep their captured output directory.
    pub fn set_downloads_config(&self, downloads: DownloadsConfig) {
        self.store.set_max_active(downloads.max_concurrent_downloads);
        *self
            .downloads
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = downloads;
    }

    /// Full current configuration: startup sections plus the live downloads
    /// section.
    pub fn current_config(&self) -> Config {
        let mut config = self.config.clone();
        config.downloads = self.downloads_config();
        config
    }

    /// Extension used for library listings (the configured audio format).
    pub fn library_extension(&self) -> &str {
        &self.config.downloader.audio_format
    }
}
