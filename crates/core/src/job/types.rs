//! Core job data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current status of a download job.
///
/// State machine flow:
/// ```text
/// queued --(pipeline starts)--> downloading --(pipeline succeeds)--> completed
///    |                              |
///    v                              v
///  error                          error
/// ```
///
/// `completed` and `error` are terminal; a terminal job never transitions
/// again and can only be removed by deletion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job accepted, pipeline not yet started.
    Queued,
    /// External pipeline is running.
    Downloading,
    /// Artifact placed in the output directory (terminal).
    Completed,
    /// Pipeline failed (terminal); see the job's `error` field.
    Error,
}

impl JobStatus {
    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Returns true if the job counts against the concurrency ceiling.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Downloading)
    }

    /// Returns the status as a string (matches the wire format).
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A download job tracked by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Unique identifier (UUID), never reused while the job exists.
    pub id: String,

    /// The submitted source URL.
    pub url: String,

    /// Optional user-supplied output name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,

    /// Current status.
    pub status: JobStatus,

    /// Human-readable name, populated once metadata is resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Download progress percentage (0-100). 0 while queued, 100 once
    /// completed, non-decreasing while downloading.
    pub progress: u8,

    /// Failure description, present only when `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// When the job was created. Clients order listings by this, newest first.
    pub created_at: DateTime<Utc>,

    /// Final artifact location, present only once `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}
