//! Application layer for boardctx.
//!
//! Wires the pure core (resolver, state machine) to the remote directory,
//! the persisted store and the URL, and runs validation with coalescing.

pub mod bootstrap;
pub mod controller;
pub mod orphan_gate;
pub mod validation_gate;

pub use controller::{ContextSnapshot, SessionContextController};
pub use orphan_gate::OrphanLinkGate;
pub use validation_gate::ValidationGate;
