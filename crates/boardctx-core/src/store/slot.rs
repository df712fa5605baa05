//! Raw storage slot trait.

use async_trait::async_trait;

use crate::context::model::PersistedContextRecord;
use crate::error::Result;

/// A single durable slot holding at most one context record.
///
/// Slots know nothing about ownership; [`PersistedContextStore`] layers the
/// per-user rules on top.
///
/// [`PersistedContextStore`]: crate::store::PersistedContextStore
#[async_trait]
pub trait ContextSlot: Send + Sync {
    /// Reads the stored record, if any.
    async fn read(&self) -> Result<Option<PersistedContextRecord>>;

    /// Replaces the stored record.
    async fn write(&self, record: PersistedContextRecord) -> Result<()>;

    /// Empties the slot.
    async fn clear(&self) -> Result<()>;
}
