//! `ContextSlot` implementations.

use async_trait::async_trait;
use boardctx_core::context::PersistedContextRecord;
use boardctx_core::error::{ContextError, Result};
use boardctx_core::store::ContextSlot;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::storage::AtomicJsonFile;

/// Slot backed by a single JSON file.
///
/// File operations run on the blocking pool.
#[derive(Clone)]
pub struct FileContextSlot {
    file: Arc<AtomicJsonFile<PersistedContextRecord>>,
}

impl FileContextSlot {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicJsonFile::new(path)),
        }
    }

    async fn blocking<R, F>(&self, op: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&AtomicJsonFile<PersistedContextRecord>) -> Result<R> + Send + 'static,
    {
        let file = Arc::clone(&self.file);
        tokio::task::spawn_blocking(move || op(file.as_ref()))
            .await
            .map_err(|e| ContextError::internal(format!("Storage task failed: {}", e)))?
    }
}

#[async_trait]
impl ContextSlot for FileContextSlot {
    async fn read(&self) -> Result<Option<PersistedContextRecord>> {
        self.blocking(|file| Ok(file.load()?)).await
    }

    async fn write(&self, record: PersistedContextRecord) -> Result<()> {
        self.blocking(move |file| Ok(file.save(&record)?)).await
    }

    async fn clear(&self) -> Result<()> {
        tracing::debug!(path = %self.file.path().display(), "Clearing context record");
        self.blocking(|file| Ok(file.remove()?)).await
    }
}

/// Process-local slot. Used by tests and by embedders without a disk.
#[derive(Default)]
pub struct MemoryContextSlot {
    record: Mutex<Option<PersistedContextRecord>>,
}

impl MemoryContextSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: PersistedContextRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

#[async_trait]
impl ContextSlot for MemoryContextSlot {
    async fn read(&self) -> Result<Option<PersistedContextRecord>> {
        Ok(self.record.lock().await.clone())
    }

    async fn write(&self, record: PersistedContextRecord) -> Result<()> {
        *self.record.lock().await = Some(record);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.record.lock().await = None;
        Ok(())
    }
}
