//! Builds a controller from configuration.

use anyhow::{Context, Result};
use boardctx_core::config::RootConfig;
use boardctx_core::directory::RemoteDirectory;
use boardctx_core::navigation::UrlNavigator;
use boardctx_core::store::PersistedContextStore;
use boardctx_infrastructure::{BoardctxPaths, FileContextSlot};
use std::path::PathBuf;
use std::sync::Arc;

use crate::controller::SessionContextController;

/// Where the persisted record lives for `config`.
pub fn context_file(config: &RootConfig) -> Result<PathBuf> {
    match &config.storage.context_file {
        Some(path) => Ok(path.clone()),
        None => BoardctxPaths::context_file().context("Failed to determine context file location"),
    }
}

/// Controller backed by the file slot named in `config`.
pub fn file_backed_controller(
    config: &RootConfig,
    directory: Arc<dyn RemoteDirectory>,
    navigator: Arc<dyn UrlNavigator>,
) -> Result<SessionContextController> {
    let path = context_file(config)?;
    tracing::debug!(path = %path.display(), "Using file context slot");

    let store = PersistedContextStore::new(Arc::new(FileContextSlot::new(path)));
    Ok(SessionContextController::new(
        directory,
        store,
        navigator,
        &config.resolution,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_context_file_wins() {
        let mut config = RootConfig::default();
        config.storage.context_file = Some(PathBuf::from("/tmp/boardctx-test/context.json"));
        assert_eq!(
            context_file(&config).unwrap(),
            PathBuf::from("/tmp/boardctx-test/context.json")
        );
    }
}
