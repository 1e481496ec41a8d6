//! Test doubles for exercising the orchestrator and the HTTP layer without
//! external tools.

mod mock_downloader;

pub use mock_downloader::{MockDownloader, ScriptedOutcome};
