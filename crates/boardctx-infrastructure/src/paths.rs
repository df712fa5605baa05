//! Path management for boardctx files.
//!
//! ```text
//! ~/.config/boardctx/
//! ├── boardctx.toml        # Engine configuration
//! └── context.json         # Persisted context record (one per device)
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for boardctx_core::ContextError {
    fn from(e: PathError) -> Self {
        boardctx_core::ContextError::config(e.to_string())
    }
}

const APP_DIR: &str = "boardctx";
const CONFIG_FILE: &str = "boardctx.toml";
const CONTEXT_FILE: &str = "context.json";

pub struct BoardctxPaths;

impl BoardctxPaths {
    /// `~/.config/boardctx` on Linux, the platform equivalent elsewhere.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Default location of the persisted context record.
    pub fn context_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join(CONTEXT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_live_in_config_dir() {
        let Ok(dir) = BoardctxPaths::config_dir() else {
            return;
        };
        assert!(dir.ends_with("boardctx"));
        assert_eq!(
            BoardctxPaths::config_file().unwrap(),
            dir.join("boardctx.toml")
        );
        assert_eq!(
            BoardctxPaths::context_file().unwrap(),
            dir.join("context.json")
        );
    }
}
