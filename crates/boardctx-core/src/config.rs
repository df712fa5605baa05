//! Configuration model for the context engine.
//!
//! Loaded from `boardctx.toml`; every section is optional and falls back
//! to its defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root of `boardctx.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RootConfig {
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
    pub resolution: ResolutionSettings,
}

/// Where the persisted context record lives.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageSettings {
    /// Explicit path of the context record file. When unset, the
    /// platform config directory is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_file: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ResolutionSettings {
    /// How many times one resolution cycle may restart from an empty slate
    /// after a `NotFound`/`Forbidden` outcome before settling empty.
    pub max_recoveries: u8,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self { max_recoveries: 1 }
    }
}
