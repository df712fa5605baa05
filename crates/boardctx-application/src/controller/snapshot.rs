use boardctx_core::context::SessionContext;
use boardctx_core::directory::ProjectSummary;
use boardctx_core::error::ContextError;
use boardctx_core::machine::{ContextMachine, Generation, Phase};
use serde::Serialize;

/// What UI consumers see of the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    pub phase: Phase,
    /// The settled context. `None` until the machine settles.
    pub context: Option<SessionContext>,
    pub generation: Generation,
    /// Show a loading affordance. Never `true` for a settled context.
    pub is_loading: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_orphans: Vec<ProjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ContextError>,
}

impl ContextSnapshot {
    pub fn of(machine: &ContextMachine) -> Self {
        Self {
            phase: machine.phase(),
            context: machine.settled_context().cloned(),
            generation: machine.generation(),
            is_loading: machine.is_loading(),
            blocked_orphans: machine.blocked_orphans().to_vec(),
            last_error: machine.last_error().cloned(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.phase == Phase::Settled
    }

    pub fn is_blocked(&self) -> bool {
        self.phase == Phase::Blocked
    }

    /// The settled project id, if any.
    pub fn project_id(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.project_id.as_deref())
    }
}
