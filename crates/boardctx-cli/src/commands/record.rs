use anyhow::{Context, Result};
use boardctx_application::bootstrap::context_file;
use boardctx_core::config::RootConfig;
use boardctx_core::store::PersistedContextStore;
use boardctx_infrastructure::FileContextSlot;
use std::sync::Arc;

fn store(config: &RootConfig) -> Result<(PersistedContextStore, std::path::PathBuf)> {
    let path = context_file(config)?;
    let store = PersistedContextStore::new(Arc::new(FileContextSlot::new(path.clone())));
    Ok((store, path))
}

pub async fn show(config: &RootConfig) -> Result<()> {
    let (store, path) = store(config)?;
    let record = store
        .peek()
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match record {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("No persisted context at {}", path.display()),
    }
    Ok(())
}

pub async fn clear(config: &RootConfig) -> Result<()> {
    let (store, path) = store(config)?;
    store
        .purge()
        .await
        .with_context(|| format!("Failed to clear {}", path.display()))?;
    tracing::info!(path = %path.display(), "Persisted context cleared");
    Ok(())
}
