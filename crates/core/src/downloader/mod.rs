//! External download pipeline.
//!
//! The pipeline resolves metadata for a URL, downloads and transcodes the
//! audio with yt-dlp (which drives ffmpeg for the MP3 extraction), and
//! relocates the artifact into the output directory. It is modeled as a
//! producer of progress events consumed by the orchestrator, so the
//! integration code can be exercised with a scripted event sequence.

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::DownloaderConfig;
pub use error::{classify_stderr, DownloaderError};
pub use traits::Downloader;
pub use types::{sanitize_file_name, DownloadEvent, DownloadOutcome, DownloadRequest, TrackMetadata};
pub use ytdlp::YtDlpDownloader;
