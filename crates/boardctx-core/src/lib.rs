//! Core domain of the board context engine.
//!
//! Models, ports and pure decision logic. Nothing in this crate performs
//! I/O on its own; storage and directory access come in through the
//! [`store::ContextSlot`] and [`directory::RemoteDirectory`] traits.

pub mod config;
pub mod context;
pub mod directory;
pub mod error;
pub mod ids;
pub mod machine;
pub mod navigation;
pub mod orphan;
pub mod resolver;
pub mod store;
pub mod validation;

pub use error::{ContextError, Result};
