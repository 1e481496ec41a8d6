//! Orchestrator error types.

use thiserror::Error;

use crate::job::JobError;

/// Errors surfaced synchronously from a submission.
///
/// Everything that happens after a job has been accepted is recorded on the
/// job record instead and observed by polling.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The submitted URL is empty or does not match an accepted source.
    #[error("invalid download URL: {0:?}")]
    InvalidUrl(String),

    /// Store-level rejection (admission or lookup).
    #[error(transparent)]
    Store(#[from] JobError),
}
