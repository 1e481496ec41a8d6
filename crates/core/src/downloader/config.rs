//! Downloader configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp based downloader.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DownloaderConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Target audio format passed to `--audio-format`.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,

    /// Target audio quality passed to `--audio-quality` (bitrate or VBR level).
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,

    /// Hard timeout for a single download in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Staging directory; artifacts are downloaded here before being moved
    /// into the output directory.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            audio_format: default_audio_format(),
            audio_quality: default_audio_quality(),
            timeout_secs: default_timeout_secs(),
            temp_dir: default_temp_dir(),
        }
    }
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_audio_quality() -> String {
    "192K".to_string()
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("tubetap")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DownloaderConfig::default();
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.audio_format, "mp3");
        assert_eq!(config.audio_quality, "192K");
        assert_eq!(config.timeout_secs, 3600);
    }

    #[test]
    fn test_deserialize_with_partial_fields() {
        let toml = r#"
ytdlp_path = "/usr/local/bin/yt-dlp"
timeout_secs = 600
"#;
        let config: DownloaderConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.ytdlp_path, PathBuf::from("/usr/local/bin/yt-dlp"));
        assert_eq!(config.timeout_secs, 600);
        // Unspecified fields fall back to defaults
        assert_eq!(config.audio_format, "mp3");
    }
}
