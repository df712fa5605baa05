pub mod record;
pub mod session;

use anyhow::{Context, Result};
use boardctx_core::config::RootConfig;
use boardctx_infrastructure::ConfigService;
use std::path::Path;

/// Loads the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<RootConfig> {
    let service = match path {
        Some(path) => ConfigService::new(path.to_path_buf()),
        None => ConfigService::default_location().context("Failed to locate config file")?,
    };
    service
        .get_config()
        .with_context(|| format!("Failed to load config from {}", service.path().display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_missing_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(Some(temp_dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(config, RootConfig::default());
    }

    #[test]
    fn test_malformed_config_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("boardctx.toml");
        std::fs::write(&path, "logging = [").unwrap();

        let err = load_config(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
