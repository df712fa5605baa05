//! Per-user persisted context store.

use std::sync::Arc;

use crate::context::model::{PersistedContextRecord, SessionContext};
use crate::error::Result;
use crate::store::slot::ContextSlot;

/// Owner-aware access to the persisted context slot.
///
/// The slot is shared by every account that signs in on the same device,
/// so a record is only handed out to the user it was written for. Asking
/// for it as anyone else empties the slot.
#[derive(Clone)]
pub struct PersistedContextStore {
    slot: Arc<dyn ContextSlot>,
}

impl PersistedContextStore {
    pub fn new(slot: Arc<dyn ContextSlot>) -> Self {
        Self { slot }
    }

    /// Loads the record written for `user_id`.
    ///
    /// A record owned by someone else is purged and reported as absent.
    /// An unreadable record is treated the same way so a corrupt slot
    /// heals itself on the next write.
    pub async fn load_for(&self, user_id: &str) -> Result<Option<PersistedContextRecord>> {
        match self.slot.read().await {
            Ok(Some(record)) if record.belongs_to(user_id) => Ok(Some(record.sanitized())),
            Ok(Some(record)) => {
                tracing::warn!(
                    owner = %record.user_id,
                    user_id = %user_id,
                    "Persisted context belongs to another user, purging"
                );
                self.slot.clear().await?;
                Ok(None)
            }
            Ok(None) => Ok(None),
            Err(e) if e.is_serialization() => {
                tracing::warn!(error = %e, "Persisted context is unreadable, purging");
                self.slot.clear().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes the record for a settled context.
    ///
    /// A record left behind by another user is purged first.
    pub async fn save(&self, context: &SessionContext) -> Result<()> {
        if let Ok(Some(existing)) = self.slot.read().await {
            if !existing.belongs_to(&context.user_id) {
                tracing::info!(
                    owner = %existing.user_id,
                    user_id = %context.user_id,
                    "Purging foreign context record before write"
                );
                self.slot.clear().await?;
            }
        }

        let record = PersistedContextRecord::from_context(context);
        tracing::debug!(
            user_id = %record.user_id,
            project_id = ?record.project_id,
            team_id = ?record.team_id,
            "Persisting context record"
        );
        self.slot.write(record).await
    }

    /// Removes whatever the slot holds.
    pub async fn purge(&self) -> Result<()> {
        self.slot.clear().await
    }

    /// Reads the slot without ownership checks. Diagnostics only.
    pub async fn peek(&self) -> Result<Option<PersistedContextRecord>> {
        self.slot.read().await
    }
}
