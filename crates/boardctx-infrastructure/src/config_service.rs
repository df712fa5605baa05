//! Configuration service.
//!
//! Loads [`RootConfig`] from `boardctx.toml` (by default
//! `~/.config/boardctx/boardctx.toml`) and caches it.

use boardctx_core::config::RootConfig;
use boardctx_core::error::{ContextError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::paths::BoardctxPaths;

/// Loads and caches the root configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<RootConfig>>>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Service reading the platform default config file.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(BoardctxPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration, loading it on first access.
    ///
    /// A missing file yields the defaults. A malformed file is an error
    /// rather than a silent fallback.
    pub fn get_config(&self) -> Result<RootConfig> {
        {
            let cached = self.config.read().unwrap_or_else(|p| p.into_inner());
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = Self::load(&self.path)?;
        *self.config.write().unwrap_or_else(|p| p.into_inner()) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        *self.config.write().unwrap_or_else(|p| p.into_inner()) = None;
    }

    fn load(path: &Path) -> Result<RootConfig> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(RootConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            ContextError::config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}
