//! Trait definitions for the downloader module.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::DownloaderError;
use super::types::{DownloadEvent, DownloadOutcome, DownloadRequest};

/// A downloader that can run the fetch → transcode → relocate pipeline for
/// a single job.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Runs the full pipeline for one job, emitting progress events in order
    /// on `events` until it returns.
    ///
    /// If the receiver is dropped, the download continues without progress
    /// reporting. The outcome's `output_path` points inside the request's
    /// captured output directory.
    async fn download(
        &self,
        request: DownloadRequest,
        events: mpsc::Sender<DownloadEvent>,
    ) -> Result<DownloadOutcome, DownloaderError>;

    /// Remove any partial output staged for a job (best effort). Called when
    /// a job is deleted while its pipeline is still running.
    async fn cleanup(&self, _job_id: &str) {}

    /// Validates that the downloader is properly configured and the external
    /// tool is reachable.
    async fn validate(&self) -> Result<(), DownloaderError>;
}
