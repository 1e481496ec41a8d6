use super::{
    types::{Config, DownloadsConfig},
    ConfigError,
};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Downloads section (path set, concurrency ceiling at least 1)
/// - Downloader timeout is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    validate_downloads(&config.downloads)?;

    if config.downloader.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate the runtime-mutable downloads section. Also applied to updates
/// arriving through the configuration API.
pub fn validate_downloads(downloads: &DownloadsConfig) -> Result<(), ConfigError> {
    if downloads.download_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "downloads.download_path cannot be empty".to_string(),
        ));
    }

    if downloads.max_concurrent_downloads == 0 {
        return Err(ConfigError::ValidationError(
            "downloads.max_concurrent_downloads must be at least 1".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let downloads = DownloadsConfig {
            max_concurrent_downloads: 0,
            ..DownloadsConfig::default()
        };
        assert!(validate_downloads(&downloads).is_err());
    }

    #[test]
    fn test_validate_empty_download_path_fails() {
        let downloads = DownloadsConfig {
            download_path: PathBuf::new(),
            ..DownloadsConfig::default()
        };
        assert!(validate_downloads(&downloads).is_err());
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.downloader.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
