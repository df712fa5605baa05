//! Orphan link gate service.

use boardctx_core::directory::RemoteDirectory;
use boardctx_core::orphan::GateSignal;
use std::sync::Arc;

/// Asks the directory for projects without a team and turns the answer
/// into a [`GateSignal`].
#[derive(Clone)]
pub struct OrphanLinkGate {
    directory: Arc<dyn RemoteDirectory>,
}

impl OrphanLinkGate {
    pub fn new(directory: Arc<dyn RemoteDirectory>) -> Self {
        Self { directory }
    }

    /// Current gate state. Never fails: a failed listing reads as `Clear`.
    pub async fn check(&self) -> GateSignal {
        let signal = GateSignal::from_listing(self.directory.get_projects_without_team().await);
        if let GateSignal::Blocked(orphans) = &signal {
            tracing::debug!(orphans = orphans.len(), "Orphan projects present");
        }
        signal
    }
}
