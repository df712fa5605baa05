//! Session context controller.
//!
//! Owns the [`ContextMachine`] and executes the effects it asks for. The
//! machine lock is only taken to apply an event; every remote call happens
//! outside of it, so ordering is enforced by the generation check rather
//! than by mutual exclusion. Record and URL writes are dropped once
//! their generation is superseded, and a write that finishes after a newer
//! one re-applies the newer target.

mod effects;
mod snapshot;

use effects::PendingWrite;

pub use snapshot::ContextSnapshot;

use boardctx_core::config::ResolutionSettings;
use boardctx_core::context::SessionUser;
use boardctx_core::directory::RemoteDirectory;
use boardctx_core::machine::{ContextEvent, ContextMachine, Effect, InvalidationReason};
use boardctx_core::navigation::UrlNavigator;
use boardctx_core::store::PersistedContextStore;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::Instrument;
use uuid::Uuid;

use crate::orphan_gate::OrphanLinkGate;
use crate::validation_gate::ValidationGate;

pub struct SessionContextController {
    directory: Arc<dyn RemoteDirectory>,
    store: PersistedContextStore,
    navigator: Arc<dyn UrlNavigator>,
    validation: ValidationGate,
    orphans: OrphanLinkGate,
    machine: Mutex<ContextMachine>,
    /// Target of the most recent record and URL write.
    latest_write: std::sync::Mutex<PendingWrite>,
    snapshots: watch::Sender<ContextSnapshot>,
}

impl SessionContextController {
    pub fn new(
        directory: Arc<dyn RemoteDirectory>,
        store: PersistedContextStore,
        navigator: Arc<dyn UrlNavigator>,
        settings: &ResolutionSettings,
    ) -> Self {
        let machine = ContextMachine::new(settings.max_recoveries);
        let (snapshots, _) = watch::channel(ContextSnapshot::of(&machine));
        Self {
            validation: ValidationGate::new(Arc::clone(&directory)),
            orphans: OrphanLinkGate::new(Arc::clone(&directory)),
            directory,
            store,
            navigator,
            machine: Mutex::new(machine),
            latest_write: std::sync::Mutex::new(PendingWrite::default()),
            snapshots,
        }
    }

    /// Starts resolution for `user` and runs it until the machine settles,
    /// blocks, or gives up.
    pub async fn mount(&self, user: SessionUser) -> ContextSnapshot {
        self.dispatch(ContextEvent::Mount { user }).await
    }

    /// Login, logout, or account switch.
    ///
    /// Logout keeps the persisted record; the next user to mount purges it
    /// if it is not theirs.
    pub async fn set_user(&self, user: Option<SessionUser>) -> ContextSnapshot {
        match user {
            Some(user) => self.mount(user).await,
            None => self.dispatch(ContextEvent::UserCleared).await,
        }
    }

    /// User-initiated project switch.
    pub async fn switch_project(&self, project_id: &str, team_id: Option<&str>) -> ContextSnapshot {
        self.dispatch(ContextEvent::SelectProject {
            project_id: Some(project_id.to_string()),
            team_id: team_id.map(str::to_string),
        })
        .await
    }

    /// User-initiated team switch. Lands on the team's first allowlisted
    /// project.
    pub async fn switch_team(&self, team_id: &str) -> ContextSnapshot {
        self.dispatch(ContextEvent::SwitchTeam {
            team_id: team_id.to_string(),
        })
        .await
    }

    /// Reports a mismatch noticed elsewhere (project deleted, access revoked).
    pub async fn invalidate(&self, reason: InvalidationReason) -> ContextSnapshot {
        self.dispatch(ContextEvent::Invalidate { reason }).await
    }

    /// Re-checks the orphan listing after the user linked projects.
    pub async fn orphans_linked(&self) -> ContextSnapshot {
        let signal = self.orphans.check().await;
        self.dispatch(ContextEvent::GateChanged { signal }).await
    }

    /// Re-runs resolution for the current user, e.g. after a transient
    /// failure.
    pub async fn refresh(&self) -> ContextSnapshot {
        let user = self.machine.lock().await.user().cloned();
        match user {
            Some(user) => self.mount(user).await,
            None => self.snapshot().await,
        }
    }

    pub async fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot::of(&*self.machine.lock().await)
    }

    /// Snapshot stream for UI consumers.
    pub fn subscribe(&self) -> watch::Receiver<ContextSnapshot> {
        self.snapshots.subscribe()
    }

    async fn dispatch(&self, event: ContextEvent) -> ContextSnapshot {
        let span = tracing::info_span!(
            "context_cycle",
            cycle_id = %Uuid::new_v4(),
            event = event.kind(),
        );
        self.run(event).instrument(span).await
    }

    async fn run(&self, event: ContextEvent) -> ContextSnapshot {
        let mut queue: VecDeque<Effect> = self.apply(event).await.into();
        while let Some(effect) = queue.pop_front() {
            if let Some(next) = self.execute(effect).await {
                queue.extend(self.apply(next).await);
            }
        }
        self.snapshot().await
    }

    async fn apply(&self, event: ContextEvent) -> Vec<Effect> {
        let mut machine = self.machine.lock().await;
        let before = machine.phase();
        let effects = machine.apply(event);
        let snapshot = ContextSnapshot::of(&machine);
        drop(machine);

        if before != snapshot.phase {
            tracing::debug!(
                from = %before,
                to = %snapshot.phase,
                generation = snapshot.generation,
                "Context phase changed"
            );
        }
        self.snapshots.send_replace(snapshot);
        effects
    }
}
