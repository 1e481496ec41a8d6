//! Error types for the downloader module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while running the download pipeline.
///
/// Variants map one-to-one to the human-readable failure classes recorded on
/// a job's `error` field: the `Display` output is what clients see.
#[derive(Debug, Error)]
pub enum DownloaderError {
    /// The yt-dlp binary was not found.
    #[error("downloader tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// Metadata resolution failed before the download started.
    #[error("failed to resolve metadata: {reason}")]
    MetadataFailed { reason: String },

    /// The content is private, removed, or otherwise restricted.
    #[error("content unavailable: {reason}")]
    Unavailable { reason: String },

    /// Network-level failure (DNS, connection, fragment fetch).
    #[error("network failure: {reason}")]
    Network { reason: String },

    /// The audio extraction / transcode step failed.
    #[error("audio transcode failed: {reason}")]
    Transcode { reason: String },

    /// The download process failed for an unclassified reason.
    #[error("download failed: {reason}")]
    Failed {
        reason: String,
        stderr: Option<String>,
    },

    /// The download exceeded the configured timeout.
    #[error("download timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Output from the downloader tool could not be parsed.
    #[error("failed to parse downloader output: {reason}")]
    ParseError { reason: String },

    /// I/O error while staging or relocating the artifact.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// The job was cancelled while the pipeline was running.
    #[error("download cancelled")]
    Cancelled,
}

impl DownloaderError {
    /// Creates an unclassified failure with captured stderr.
    pub fn failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a metadata resolution error.
    pub fn metadata_failed(reason: impl Into<String>) -> Self {
        Self::MetadataFailed {
            reason: reason.into(),
        }
    }
}

/// Classify yt-dlp stderr output into a [`DownloaderError`].
///
/// yt-dlp reports failures as free text; these patterns cover the error
/// classes worth distinguishing for the user: unavailable content, network
/// trouble and transcode (postprocessing) failures.
pub fn classify_stderr(stderr: &str) -> DownloaderError {
    let lower = stderr.to_lowercase();

    // Most informative line first: yt-dlp prefixes hard failures with "ERROR:".
    let reason = stderr
        .lines()
        .find(|l| l.contains("ERROR:"))
        .map(|l| l.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| first_nonempty_line(stderr));

    if lower.contains("private video")
        || lower.contains("video unavailable")
        || lower.contains("this video is not available")
        || lower.contains("sign in to confirm your age")
        || lower.contains("members-only")
        || lower.contains("has been removed")
        || lower.contains("not available in your country")
    {
        return DownloaderError::Unavailable { reason };
    }

    if lower.contains("unable to download")
        || lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("temporary failure in name resolution")
        || lower.contains("getaddrinfo")
        || lower.contains("network")
    {
        return DownloaderError::Network { reason };
    }

    if lower.contains("postprocessing") || lower.contains("ffmpeg") {
        return DownloaderError::Transcode { reason };
    }

    DownloaderError::failed(
        reason,
        if stderr.is_empty() {
            None
        } else {
            Some(stderr.to_string())
        },
    )
}

fn first_nonempty_line(text: &str) -> String {
    text.lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string()
}
