//! Downloader data types.

use serde::Deserialize;
use std::path::PathBuf;

/// A request to run the download pipeline for one job.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Id of the job this download belongs to.
    pub job_id: String,

    /// The source URL.
    pub url: String,

    /// Optional output name override; the final filename derives from this
    /// when present, otherwise from the resolved title.
    pub custom_name: Option<String>,

    /// Output directory captured at launch time. Configuration changes made
    /// while the download is in flight do not affect it.
    pub output_dir: PathBuf,
}

/// A discrete progress event emitted by the pipeline.
///
/// Events are emitted in order; the first one carries the resolved title.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadEvent {
    /// Percentage complete, 0.0-100.0.
    pub percent: f32,

    /// Resolved title, present on the first event once metadata is known.
    pub title: Option<String>,
}

/// Description of the final artifact on pipeline success.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    /// Absolute location of the placed artifact.
    pub output_path: PathBuf,

    /// Resolved title.
    pub title: String,

    /// Size of the artifact in bytes.
    pub size_bytes: u64,
}

/// Metadata resolved for a URL before downloading.
///
/// Deserialized from `yt-dlp --dump-single-json` output; only the fields we
/// use are declared.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackMetadata {
    /// Video/track title.
    pub title: String,

    /// Channel or uploader name.
    #[serde(default)]
    pub uploader: Option<String>,

    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Sanitize a user-supplied or resolved name into a safe file stem.
///
/// Path separators and characters that are invalid on common filesystems are
/// replaced with underscores; surrounding whitespace and dots are trimmed.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_file_name("My Song"), "My Song");
    }

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_file_name("what? a <title>"), "what_ a _title_");
    }

    #[test]
    fn test_sanitize_empty_falls_back() {
        assert_eq!(sanitize_file_name(""), "untitled");
        assert_eq!(sanitize_file_name("   "), "untitled");
        assert_eq!(sanitize_file_name("..."), "untitled");
    }

    #[test]
    fn test_metadata_parses_dump_json() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "uploader": "Rick Astley",
            "duration": 212.0,
            "formats": []
        }"#;
        let metadata: TrackMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.title, "Never Gonna Give You Up");
        assert_eq!(metadata.uploader.as_deref(), Some("Rick Astley"));
        assert_eq!(metadata.duration, Some(212.0));
    }

    #[test]
    fn test_metadata_tolerates_missing_optional_fields() {
        let json = r#"{ "title": "Clip" }"#;
        let metadata: TrackMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.title, "Clip");
        assert!(metadata.uploader.is_none());
    }
}
