pub mod config;
pub mod downloader;
pub mod job;
pub mod library;
pub mod metrics;
pub mod orchestrator;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, validate_downloads, Config, ConfigError,
    DownloadsConfig, ServerConfig,
};
pub use downloader::{
    DownloadEvent, DownloadOutcome, DownloadRequest, Downloader, DownloaderConfig, DownloaderError,
    YtDlpDownloader,
};
pub use job::{Job, JobError, JobStatus, JobStore, JobUpdate, MemoryJobStore, NewJob};
pub use library::{resolve_library_path, scan_library, LibraryFile};
pub use orchestrator::{DownloadOrchestrator, OrchestratorError};
