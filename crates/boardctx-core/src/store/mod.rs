pub mod persisted;
pub mod slot;

pub use persisted::PersistedContextStore;
pub use slot::ContextSlot;
