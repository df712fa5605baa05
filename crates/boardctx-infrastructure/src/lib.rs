pub mod config_service;
pub mod context_slot;
pub mod navigator;
pub mod paths;
pub mod static_directory;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::context_slot::{FileContextSlot, MemoryContextSlot};
pub use crate::navigator::MemoryNavigator;
pub use crate::paths::BoardctxPaths;
pub use crate::static_directory::{DirectoryFixture, StaticDirectory};
