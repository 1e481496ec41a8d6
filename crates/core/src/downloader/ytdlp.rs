//! yt-dlp based downloader implementation.
//!
//! yt-dlp handles metadata resolution, the media download and the ffmpeg
//! transcode to the target audio format in one invocation; this module
//! drives the subprocess, parses its progress output and relocates the
//! finished artifact into the output directory.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::DownloaderConfig;
use super::error::{classify_stderr, DownloaderError};
use super::traits::Downloader;
use super::types::{
    sanitize_file_name, DownloadEvent, DownloadOutcome, DownloadRequest, TrackMetadata,
};
use async_trait::async_trait;

/// How many trailing stderr lines to keep for failure classification.
const STDERR_TAIL_LINES: usize = 200;

/// Matches yt-dlp `--newline` progress lines like
/// `[download]  42.7% of 3.42MiB at 1.21MiB/s ETA 00:02`.
static PROGRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[download\]\s+(\d+(?:\.\d+)?)%").unwrap());

/// Extract the progress percentage from a yt-dlp output line.
fn parse_progress_line(line: &str) -> Option<f32> {
    let caps = PROGRESS_RE.captures(line)?;
    caps.get(1)?.as_str().parse::<f32>().ok()
}

/// yt-dlp based downloader.
pub struct YtDlpDownloader {
    config: DownloaderConfig,
}

impl YtDlpDownloader {
    /// Creates a new downloader with the given configuration.
    pub fn new(config: DownloaderConfig) -> Self {
        Self { config }
    }

    /// Creates a downloader with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(DownloaderConfig::default())
    }

    /// Builds the yt-dlp argument list for an audio download.
    fn build_download_args(&self, url: &str, output_template: &Path) -> Vec<String> {
        vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.config.audio_format.clone(),
            "--audio-quality".to_string(),
            self.config.audio_quality.clone(),
            "--embed-metadata".to_string(),
            "--newline".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().to_string(),
            url.to_string(),
        ]
    }

    fn spawn_error(&self, e: std::io::Error) -> DownloaderError {
        if e.kind() == std::io::ErrorKind::NotFound {
            DownloaderError::ToolNotFound {
                path: self.config.ytdlp_path.clone(),
            }
        } else {
            DownloaderError::Io(e)
        }
    }

    /// Resolves metadata for a URL without downloading anything.
    async fn resolve_metadata(&self, url: &str) -> Result<TrackMetadata, DownloaderError> {
        let output = Command::new(&self.config.ytdlp_path)
            .args(["--dump-single-json", "--no-download", "--no-playlist", "--no-warnings"])
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Keep the specific classification (unavailable, network) when we
            // have one; fold unclassified failures into a metadata error.
            return Err(match classify_stderr(&stderr) {
                DownloaderError::Failed { reason, .. } => DownloaderError::metadata_failed(reason),
                classified => classified,
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| DownloaderError::ParseError {
            reason: format!("invalid metadata JSON: {}", e),
        })
    }

    /// Runs the yt-dlp download into `work_dir`, forwarding progress events.
    async fn run_download(
        &self,
        request: &DownloadRequest,
        work_dir: &Path,
        stem: &str,
        events: &mpsc::Sender<DownloadEvent>,
    ) -> Result<(), DownloaderError> {
        // yt-dlp substitutes the real extension for %(ext)s after transcoding.
        let template = work_dir.join(format!("{}.%(ext)s", stem));
        let args = self.build_download_args(&request.url, &template);

        let mut child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child.stdout.take().expect("stdout should be captured");
        let stderr = child.stderr.take().expect("stderr should be captured");

        // Collect the stderr tail off to the side for failure classification.
        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut tail: Vec<String> = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!("yt-dlp stderr: {}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail.join("\n")
        });

        let mut reader = BufReader::new(stdout).lines();
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);

        let waited = timeout(timeout_duration, async {
            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(percent) = parse_progress_line(&line) {
                    let _ = events.send(DownloadEvent { percent, title: None }).await;
                }
            }
            child.wait().await
        })
        .await;

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(DownloaderError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(DownloaderError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        let stderr_text = stderr_task.await.unwrap_or_default();
        if !status.success() {
            return Err(classify_stderr(&stderr_text));
        }

        Ok(())
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn download(
        &self,
        request: DownloadRequest,
        events: mpsc::Sender<DownloadEvent>,
    ) -> Result<DownloadOutcome, DownloaderError> {
        let metadata = self.resolve_metadata(&request.url).await?;
        let _ = events
            .send(DownloadEvent {
                percent: 0.0,
                title: Some(metadata.title.clone()),
            })
            .await;

        // Stage into a per-job directory so partial output never lands in
        // the library and cancellation can clean up by job id.
        let work_dir = self.config.temp_dir.join(&request.job_id);
        fs::create_dir_all(&work_dir).await?;

        let stem = match &request.custom_name {
            Some(name) => sanitize_file_name(name),
            None => sanitize_file_name(&metadata.title),
        };

        let run = self.run_download(&request, &work_dir, &stem, &events).await;
        if let Err(e) = run {
            let _ = fs::remove_dir_all(&work_dir).await;
            return Err(e);
        }

        let staged = find_artifact(&work_dir, &self.config.audio_format).await?;

        fs::create_dir_all(&request.output_dir).await?;
        let file_name = staged
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| DownloaderError::ParseError {
                reason: "staged artifact has no file name".to_string(),
            })?;
        let destination = request.output_dir.join(file_name);
        move_into_place(&staged, &destination).await?;
        let _ = fs::remove_dir_all(&work_dir).await;

        let size_bytes = fs::metadata(&destination).await.map(|m| m.len()).unwrap_or(0);
        let _ = events
            .send(DownloadEvent {
                percent: 100.0,
                title: None,
            })
            .await;

        Ok(DownloadOutcome {
            output_path: destination,
            title: metadata.title,
            size_bytes,
        })
    }

    async fn cleanup(&self, job_id: &str) {
        let work_dir = self.config.temp_dir.join(job_id);
        if let Err(e) = fs::remove_dir_all(&work_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("failed to remove staging dir {:?}: {}", work_dir, e);
            }
        }
    }

    async fn validate(&self) -> Result<(), DownloaderError> {
        let result = Command::new(&self.config.ytdlp_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await;

        if let Err(e) = result {
            return Err(self.spawn_error(e));
        }

        fs::create_dir_all(&self.config.temp_dir).await?;

        Ok(())
    }
}

/// Find the finished artifact in the staging directory.
///
/// Prefers a file with the target extension; in-flight `.part`/`.ytdl`
/// leftovers are never returned.
async fn find_artifact(work_dir: &Path, extension: &str) -> Result<PathBuf, DownloaderError> {
    let mut entries = fs::read_dir(work_dir).await?;
    let mut fallback: Option<PathBuf> = None;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext == extension => return Ok(path),
            Some("part") | Some("ytdl") => continue,
            _ => fallback = Some(path),
        }
    }

    fallback.ok_or_else(|| DownloaderError::failed("no output artifact produced", None))
}

/// Move a file into its final location.
///
/// Rename first; cross-filesystem moves fail with EXDEV and fall back to
/// copy + remove.
async fn move_into_place(source: &Path, destination: &Path) -> Result<(), DownloaderError> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) => {
            fs::copy(source, destination).await?;
            fs::remove_file(source).await?;
            Ok(())
        }
        Err(e) => Err(DownloaderError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_progress_line() {
        assert_eq!(
            parse_progress_line("[download]  42.7% of 3.42MiB at 1.21MiB/s ETA 00:02"),
            Some(42.7)
        );
        assert_eq!(parse_progress_line("[download] 100% of 3.42MiB"), Some(100.0));
        assert_eq!(parse_progress_line("[download]   0.0% of ~3.42MiB"), Some(0.0));
    }

    #[test]
    fn test_parse_progress_ignores_other_lines() {
        assert_eq!(parse_progress_line("[ExtractAudio] Destination: x.mp3"), None);
        assert_eq!(parse_progress_line("[youtube] abc: Downloading webpage"), None);
        assert_eq!(parse_progress_line(""), None);
    }

    #[test]
    fn test_build_download_args() {
        let downloader = YtDlpDownloader::with_defaults();
        let args = downloader.build_download_args(
            "https://youtu.be/abc",
            Path::new("/tmp/work/song.%(ext)s"),
        );

        assert!(args.contains(&"--extract-audio".to_string()));
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://youtu.be/abc"));

        let format_pos = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[format_pos + 1], "mp3");

        let out_pos = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[out_pos + 1], "/tmp/work/song.%(ext)s");
    }

    #[tokio::test]
    async fn test_find_artifact_prefers_target_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("song.webm"), b"intermediate").await.unwrap();
        fs::write(dir.path().join("song.mp3"), b"final").await.unwrap();

        let found = find_artifact(dir.path(), "mp3").await.unwrap();
        assert_eq!(found.file_name().unwrap(), "song.mp3");
    }

    #[tokio::test]
    async fn test_find_artifact_skips_partial_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("song.mp3.part"), b"partial").await.unwrap();

        let err = find_artifact(dir.path(), "mp3").await.unwrap_err();
        assert!(err.to_string().contains("no output artifact"));
    }

    #[tokio::test]
    async fn test_find_artifact_empty_dir_fails() {
        let dir = TempDir::new().unwrap();
        let err = find_artifact(dir.path(), "mp3").await.unwrap_err();
        assert!(matches!(err, DownloaderError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_move_into_place_renames() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("staged.mp3");
        let destination = dir.path().join("final.mp3");
        fs::write(&source, b"audio").await.unwrap();

        move_into_place(&source, &destination).await.unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&destination).await.unwrap(), b"audio");
    }

    #[tokio::test]
    async fn test_cleanup_is_quiet_for_missing_dir() {
        let dir = TempDir::new().unwrap();
        let downloader = YtDlpDownloader::new(DownloaderConfig {
            temp_dir: dir.path().to_path_buf(),
            ..DownloaderConfig::default()
        });

        // No staging dir exists for this job; cleanup must not fail.
        downloader.cleanup("no-such-job").await;
    }

    #[tokio::test]
    async fn test_cleanup_removes_staging_dir() {
        let dir = TempDir::new().unwrap();
        let downloader = YtDlpDownloader::new(DownloaderConfig {
            temp_dir: dir.path().to_path_buf(),
            ..DownloaderConfig::default()
        });

        let work_dir = dir.path().join("job-1");
        fs::create_dir_all(&work_dir).await.unwrap();
        fs::write(work_dir.join("song.mp3.part"), b"partial").await.unwrap();

        downloader.cleanup("job-1").await;
        assert!(!work_dir.exists());
    }
}
