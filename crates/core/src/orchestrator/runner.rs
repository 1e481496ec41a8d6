//! Download orchestrator implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::config::DownloadsConfig;
use crate::downloader::{DownloadEvent, DownloadOutcome, DownloadRequest, Downloader, DownloaderError};
use crate::job::{JobError, JobStatus, JobStore, JobUpdate, NewJob};
use crate::metrics;

use super::types::OrchestratorError;

/// Per-job progress event channel depth. The pipeline blocks on a full
/// channel, so events for one job are always applied in emission order.
const EVENT_BUFFER: usize = 64;

/// Accepted source URL shapes: videos and shorts on youtube.com,
/// music.youtube.com, m.youtube.com or youtu.be.
static SOURCE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https?://((www|m|music)\.)?youtube\.com/(watch\?\S+|shorts/\S+)$|^https?://youtu\.be/\S+$",
    )
    .unwrap()
});

fn is_valid_source_url(url: &str) -> bool {
    SOURCE_URL_RE.is_match(url)
}

fn lock_active(
    map: &Mutex<HashMap<String, AbortHandle>>,
) -> MutexGuard<'_, HashMap<String, AbortHandle>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The download orchestrator.
///
/// Owns no job state itself: every mutation goes through the job store, so a
/// pipeline can never hold a private copy that diverges from what clients
/// poll.
pub struct DownloadOrchestrator {
    store: Arc<dyn JobStore>,
    downloader: Arc<dyn Downloader>,
    downloads_config: Arc<RwLock<DownloadsConfig>>,
    active: Arc<Mutex<HashMap<String, AbortHandle>>>,
}

impl DownloadOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        store: Arc<dyn JobStore>,
        downloader: Arc<dyn Downloader>,
        downloads_config: Arc<RwLock<DownloadsConfig>>,
    ) -> Self {
        Self {
            store,
            downloader,
            downloads_config,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Accept a submission and launch its pipeline.
    ///
    /// Validation and admission happen synchronously; on success the job id
    /// is returned immediately and the pipeline runs out-of-band. All later
    /// failures are recorded on the job record, never returned here.
    pub fn submit(
        &self,
        url: &str,
        custom_name: Option<String>,
    ) -> Result<String, OrchestratorError> {
        let url = url.trim();
        if url.is_empty() || !is_valid_source_url(url) {
            return Err(OrchestratorError::InvalidUrl(url.to_string()));
        }

        let job = self.store.create(NewJob {
            url: url.to_string(),
            custom_name,
        })?;
        metrics::DOWNLOADS_SUBMITTED.inc();
        info!(job_id = %job.id, url = %job.url, "download queued");

        // The output directory is captured now; configuration changes made
        // while this job is in flight do not relocate it.
        let request = DownloadRequest {
            job_id: job.id.clone(),
            url: job.url.clone(),
            custom_name: job.custom_name.clone(),
            output_dir: self.output_dir_for_new_job(),
        };

        let store = Arc::clone(&self.store);
        let downloader = Arc::clone(&self.downloader);
        let active = Arc::clone(&self.active);
        let job_id = job.id.clone();

        // Holding the map lock across the spawn orders the insert before the
        // task's own removal of its entry.
        {
            let mut entries = lock_active(&self.active);
            let handle = tokio::spawn(async move {
                run_job(store, downloader, request).await;
                lock_active(&active).remove(&job_id);
            });
            entries.insert(job.id.clone(), handle.abort_handle());
        }

        Ok(job.id)
    }

    /// Stop the pipeline for a job (best effort) and drop any staged partial
    /// output. Safe to call for jobs that already reached a terminal state.
    pub async fn cancel(&self, id: &str) {
        let handle = lock_active(&self.active).remove(id);
        if let Some(handle) = handle {
            handle.abort();
            debug!(job_id = %id, "aborted download pipeline");
        }
        self.downloader.cleanup(id).await;
    }

    /// Number of pipelines currently running.
    pub fn active_pipelines(&self) -> usize {
        lock_active(&self.active).len()
    }

    fn output_dir_for_new_job(&self) -> PathBuf {
        let config = self
            .downloads_config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut dir = config.download_path.clone();
        if config.organize_by_date {
            dir.push(Utc::now().format("%Y-%m-%d").to_string());
        }
        dir
    }
}

/// Decrements the active-downloads gauge when the pipeline task ends,
/// including when it is aborted mid-flight.
struct ActiveGauge;

impl Drop for ActiveGauge {
    fn drop(&mut self) {
        metrics::ACTIVE_DOWNLOADS.dec();
    }
}

/// What the per-job event loop resolved to.
enum Drive {
    /// The pipeline ran to completion (success or failure).
    Finished(Result<DownloadOutcome, DownloaderError>),
    /// The job record disappeared mid-flight; discard everything.
    Deleted,
}

/// Drive one job's pipeline to its terminal update.
async fn run_job(
    store: Arc<dyn JobStore>,
    downloader: Arc<dyn Downloader>,
    request: DownloadRequest,
) {
    let job_id = request.job_id.clone();
    metrics::DOWNLOADS_STARTED.inc();
    metrics::ACTIVE_DOWNLOADS.inc();
    let _active_gauge = ActiveGauge;

    let drive = {
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let download = downloader.download(request, tx);
        tokio::pin!(download);

        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Some(event) => {
                        if !apply_event(store.as_ref(), &job_id, event) {
                            break Drive::Deleted;
                        }
                    }
                    None => break Drive::Finished((&mut download).await),
                },
                result = &mut download => {
                    // The pipeline finished; apply the events it already
                    // buffered before reporting the terminal state.
                    let mut deleted = false;
                    while let Ok(event) = rx.try_recv() {
                        if !apply_event(store.as_ref(), &job_id, event) {
                            deleted = true;
                            break;
                        }
                    }
                    break if deleted {
                        Drive::Deleted
                    } else {
                        Drive::Finished(result)
                    };
                }
            }
        }
        // The download future is dropped here; an unfinished subprocess is
        // killed via kill-on-drop.
    };

    let result = match drive {
        Drive::Deleted => {
            debug!(job_id = %job_id, "job deleted mid-download, discarding pipeline");
            downloader.cleanup(&job_id).await;
            return;
        }
        Drive::Finished(result) => result,
    };

    // Exactly one terminal update per job. A deletion racing this update
    // shows up as NotFound and is swallowed rather than resurrecting the
    // record.
    match result {
        Ok(outcome) => {
            let update = JobUpdate::new()
                .with_status(JobStatus::Completed)
                .with_progress(100)
                .with_title(outcome.title)
                .with_output_path(outcome.output_path);
            match store.update(&job_id, update) {
                Ok(_) => {
                    info!(job_id = %job_id, "download completed");
                    metrics::DOWNLOADS_COMPLETED.inc();
                }
                Err(JobError::NotFound(_)) => {
                    debug!(job_id = %job_id, "job deleted before completion was recorded");
                }
                Err(e) => warn!(job_id = %job_id, "failed to record completion: {}", e),
            }
        }
        Err(err) => {
            warn!(job_id = %job_id, "download failed: {}", err);
            metrics::DOWNLOADS_FAILED.inc();
            let update = JobUpdate::new()
                .with_status(JobStatus::Error)
                .with_error(err.to_string());
            match store.update(&job_id, update) {
                Ok(_) => {}
                Err(JobError::NotFound(_)) => {
                    debug!(job_id = %job_id, "job deleted before failure was recorded");
                }
                Err(e) => warn!(job_id = %job_id, "failed to record failure: {}", e),
            }
        }
    }
}

/// Apply a single pipeline event to the store.
///
/// Returns false when the job no longer exists.
fn apply_event(store: &dyn JobStore, job_id: &str, event: DownloadEvent) -> bool {
    let mut update = JobUpdate::new()
        .with_status(JobStatus::Downloading)
        .with_progress(event.percent.clamp(0.0, 100.0).round() as u8);
    if let Some(title) = event.title {
        update = update.with_title(title);
    }

    match store.update(job_id, update) {
        Ok(_) => true,
        Err(JobError::NotFound(_)) => false,
        Err(e) => {
            // A late event racing a terminal update lands here; drop it.
            warn!(job_id = %job_id, "dropping pipeline event: {}", e);
            true
        }
    }
}
