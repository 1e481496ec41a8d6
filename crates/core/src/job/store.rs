//! Job storage trait and operation types.

use std::path::PathBuf;

use thiserror::Error;

use super::types::{Job, JobStatus};

/// Error type for job store operations.
#[derive(Debug, Error)]
pub enum JobError {
    /// No job exists for the given id.
    #[error("download not found: {0}")]
    NotFound(String),

    /// Admission rejected: the number of queued + downloading jobs is at the
    /// configured ceiling.
    #[error("maximum concurrent downloads reached (limit: {limit})")]
    CapacityExceeded { limit: usize },

    /// An update attempted to change the status of a terminal job. Only
    /// deletion may remove a completed or failed job.
    #[error("cannot move job {job_id} from {current_status} to {requested_status}")]
    InvalidTransition {
        job_id: String,
        current_status: String,
        requested_status: String,
    },
}

/// Request to create a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    /// The submitted source URL.
    pub url: String,
    /// Optional output name override.
    pub custom_name: Option<String>,
}

/// Partial field changes applied atomically to a job record.
///
/// Unset fields are left untouched. Progress values are clamped to 0-100 and
/// regressive values are dropped by the store, so callers can forward raw
/// pipeline events without pre-filtering.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub title: Option<String>,
    pub progress: Option<u8>,
    pub error: Option<String>,
    pub output_path: Option<PathBuf>,
}

impl JobUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status.
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the resolved title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the progress percentage.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Set the failure description (takes effect with `status = error`).
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Set the final artifact location.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}

/// Trait for job storage backends.
///
/// The in-memory implementation is the only backend today; the interface is
/// kept narrow so a shared external store could replace it without touching
/// the orchestrator or the HTTP layer.
pub trait JobStore: Send + Sync {
    /// Create a new job in `queued` state with progress 0.
    ///
    /// Fails with [`JobError::CapacityExceeded`] when the count of
    /// queued + downloading jobs is at the configured maximum.
    fn create(&self, new_job: NewJob) -> Result<Job, JobError>;

    /// Get a job by id.
    fn get(&self, id: &str) -> Result<Job, JobError>;

    /// Snapshot of all jobs, newest first.
    fn list(&self) -> Vec<Job>;

    /// Apply a partial update atomically.
    ///
    /// Fails with [`JobError::NotFound`] if the job is absent and with
    /// [`JobError::InvalidTransition`] if the job is terminal and the update
    /// carries a status change.
    fn update(&self, id: &str, update: JobUpdate) -> Result<Job, JobError>;

    /// Remove a job. Fails with [`JobError::NotFound`] if absent, so callers
    /// can distinguish "already gone".
    fn delete(&self, id: &str) -> Result<Job, JobError>;

    /// Number of jobs currently counting against the concurrency ceiling.
    fn active_count(&self) -> usize;

    /// Replace the admission ceiling (takes effect for subsequent creates).
    fn set_max_active(&self, max: usize);
}
