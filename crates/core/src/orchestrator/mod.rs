//! Download orchestrator.
//!
//! Turns a validated submission into a job and drives it to a terminal
//! state. Submission itself is synchronous (validation + store insert); the
//! external pipeline runs on a background task per job and its progress
//! events are applied to the job store in emission order.

mod runner;
mod types;

pub use runner::DownloadOrchestrator;
pub use types::OrchestratorError;
