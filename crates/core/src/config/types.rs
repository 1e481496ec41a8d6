use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::downloader::DownloaderConfig;

/// Root configuration
///
/// Every section has defaults, so a missing config file yields a usable
/// configuration (overridable through the environment).
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Download management configuration.
///
/// This section may be replaced at runtime through the configuration API;
/// the output directory is captured per job at launch, so a change never
/// relocates jobs already in flight.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DownloadsConfig {
    /// Directory downloads are placed into.
    #[serde(default = "default_download_path")]
    pub download_path: PathBuf,

    /// Maximum number of jobs that may be queued or downloading at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_downloads: usize,

    /// Place artifacts into a per-day subdirectory (YYYY-MM-DD).
    #[serde(default)]
    pub organize_by_date: bool,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            download_path: default_download_path(),
            max_concurrent_downloads: default_max_concurrent(),
            organize_by_date: false,
        }
    }
}

fn default_download_path() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_max_concurrent() -> usize {
    3
}
