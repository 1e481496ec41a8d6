//! In-memory job store implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use super::store::{JobError, JobStore, JobUpdate, NewJob};
use super::types::{Job, JobStatus};

/// In-memory implementation of [`JobStore`].
///
/// A single `RwLock<HashMap>` owns every record; all reads and writes to a
/// record are serialized behind it, and `list()` clones the whole map under
/// the read lock so snapshots never observe a half-applied update.
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
    max_active: AtomicUsize,
}

impl MemoryJobStore {
    /// Create a store with the given concurrency ceiling.
    pub fn new(max_active: usize) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            max_active: AtomicUsize::new(max_active),
        }
    }

    fn read_jobs(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        self.jobs.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_jobs(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        self.jobs.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, new_job: NewJob) -> Result<Job, JobError> {
        let limit = self.max_active.load(Ordering::Relaxed);
        let mut jobs = self.write_jobs();

        let active = jobs.values().filter(|j| j.status.is_active()).count();
        if active >= limit {
            return Err(JobError::CapacityExceeded { limit });
        }

        let job = Job {
            id: Uuid::new_v4().to_string(),
            url: new_job.url,
            custom_name: new_job.custom_name,
            status: JobStatus::Queued,
            title: None,
            progress: 0,
            error: None,
            created_at: Utc::now(),
            output_path: None,
        };

        jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn get(&self, id: &str) -> Result<Job, JobError> {
        self.read_jobs()
            .get(id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.read_jobs().values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        jobs
    }

    fn update(&self, id: &str, update: JobUpdate) -> Result<Job, JobError> {
        let mut jobs = self.write_jobs();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))?;

        if job.status.is_terminal() {
            if let Some(requested) = update.status {
                return Err(JobError::InvalidTransition {
                    job_id: id.to_string(),
                    current_status: job.status.to_string(),
                    requested_status: requested.to_string(),
                });
            }
            // Late progress/title events after a terminal update are dropped.
            return Ok(job.clone());
        }

        if let Some(status) = update.status {
            job.status = status;
            match status {
                JobStatus::Completed => job.progress = 100,
                JobStatus::Error => {
                    job.error = Some(
                        update
                            .error
                            .clone()
                            .unwrap_or_else(|| "download failed".to_string()),
                    );
                }
                _ => {}
            }
        }

        if let Some(title) = update.title {
            job.title = Some(title);
        }

        // Progress is only meaningful while downloading; values are clamped
        // and regressive events dropped to keep it non-decreasing.
        if job.status == JobStatus::Downloading {
            if let Some(progress) = update.progress {
                let progress = progress.min(100);
                if progress > job.progress {
                    job.progress = progress;
                }
            }
        }

        if let Some(path) = update.output_path {
            job.output_path = Some(path);
        }

        Ok(job.clone())
    }

    fn delete(&self, id: &str) -> Result<Job, JobError> {
        self.write_jobs()
            .remove(id)
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    fn active_count(&self) -> usize {
        self.read_jobs()
            .values()
            .filter(|j| j.status.is_active())
            .count()
    }

    fn set_max_active(&self, max: usize) {
        self.max_active.store(max, Ordering::Relaxed);
    }
}
