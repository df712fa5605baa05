//! Effect execution: remote lookups, persistence and URL writes.

use boardctx_core::context::{PersistedContextRecord, SessionContext, SessionUser, UrlParams};
use boardctx_core::directory::ProjectSummary;
use boardctx_core::ids::clean_id;
use boardctx_core::machine::{ContextEvent, Effect, Generation, ResolveHints, ResolveMode};
use boardctx_core::resolver::{Candidate, ResolverInput, resolve};
use std::sync::{MutexGuard, PoisonError};

use super::SessionContextController;

/// What the record and the URL should hold. `context: None` means purged.
#[derive(Debug, Clone, Default)]
pub(super) struct PendingWrite {
    seq: u64,
    generation: Generation,
    context: Option<SessionContext>,
}

impl SessionContextController {
    /// Runs one effect. Returns the event that reports its result, if any.
    pub(super) async fn execute(&self, effect: Effect) -> Option<ContextEvent> {
        match effect {
            Effect::Resolve {
                generation,
                user,
                mode,
                hints,
            } => Some(self.resolve_candidate(generation, &user, mode, &hints).await),
            Effect::Validate {
                generation,
                candidate,
            } => candidate
                .project_id
                .map(|project_id| ContextEvent::ValidationDispatched {
                    generation,
                    project_id,
                }),
            Effect::RunValidation {
                generation,
                candidate,
            } => {
                let project_id = candidate.project_id.clone().unwrap_or_default();
                Some(match self.validation.validate(&candidate).await {
                    Ok(outcome) => ContextEvent::ValidationFinished {
                        generation,
                        project_id,
                        outcome,
                    },
                    Err(error) => ContextEvent::ValidationFailed {
                        generation,
                        project_id,
                        error,
                    },
                })
            }
            Effect::Commit {
                generation,
                context,
            } => {
                self.write(generation, Some(context)).await;
                None
            }
            Effect::Purge { generation } => {
                self.write(generation, None).await;
                None
            }
            Effect::RefreshGate => Some(ContextEvent::GateChanged {
                signal: self.orphans.check().await,
            }),
        }
    }

    async fn resolve_candidate(
        &self,
        generation: Generation,
        user: &SessionUser,
        mode: ResolveMode,
        hints: &ResolveHints,
    ) -> ContextEvent {
        tracing::debug!(user_id = %user.id, generation, mode = ?mode, "Resolving candidate");

        // Read the record first so a foreign one is purged even when the
        // gate ends up blocking.
        let (url, persisted) = match mode {
            ResolveMode::Restore => (self.navigator.current(), self.load_record(&user.id).await),
            ResolveMode::FreshSlate | ResolveMode::Team(_) => (UrlParams::default(), None),
        };

        let gate = self.orphans.check().await;
        if gate.is_blocked() {
            return ContextEvent::Resolved {
                generation,
                gate,
                personal_workspace_id: None,
                candidate: None,
            };
        }

        let personal_workspace = match self.directory.get_personal_workspace().await {
            Ok(workspace) => workspace,
            Err(e) => {
                tracing::warn!(error = %e, "Personal workspace lookup failed, continuing without it");
                None
            }
        };
        let personal_workspace_id = personal_workspace
            .as_ref()
            .and_then(|workspace| clean_id(Some(workspace.id.as_str())));

        let candidate = match mode {
            ResolveMode::Team(team_id) => {
                self.first_team_project(user, &team_id, &hints.rejected)
                    .await
            }
            ResolveMode::Restore | ResolveMode::FreshSlate => {
                let input = ResolverInput {
                    user,
                    url: &url,
                    persisted: persisted.as_ref(),
                    transient_team_id: hints.transient_team_id.as_deref(),
                    personal_workspace: personal_workspace.as_ref(),
                    rejected: &hints.rejected,
                };
                match resolve(&input) {
                    Candidate::Resolved { context, source } => {
                        tracing::debug!(
                            project_id = ?context.project_id,
                            team_id = ?context.team_id,
                            source = %source,
                            "Candidate resolved"
                        );
                        Some(context)
                    }
                    Candidate::NeedsTeamProjectLookup { team_id } => {
                        self.first_team_project(user, &team_id, &hints.rejected)
                            .await
                    }
                    Candidate::None => None,
                }
            }
        };

        ContextEvent::Resolved {
            generation,
            gate,
            personal_workspace_id,
            candidate,
        }
    }

    async fn load_record(&self, user_id: &str) -> Option<PersistedContextRecord> {
        match self.store.load_for(user_id).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "Persisted context unavailable, ignoring it");
                None
            }
        }
    }

    /// First allowlisted project of `team_id` that was not rejected earlier
    /// in this cycle.
    async fn first_team_project(
        &self,
        user: &SessionUser,
        team_id: &str,
        rejected: &[String],
    ) -> Option<SessionContext> {
        let projects = match self.directory.get_projects_by_team(team_id).await {
            Ok(projects) => projects,
            Err(e) => {
                tracing::warn!(team_id = %team_id, error = %e, "Team project lookup failed");
                return None;
            }
        };

        let first = projects.iter().find(|p| {
            clean_id(Some(p.id.as_str())).is_some_and(|id| !rejected.contains(&id))
        });
        match first {
            Some(project) => {
                tracing::info!(
                    team_id = %team_id,
                    project_id = %project.id,
                    "No project selected, taking the team's first project"
                );
                Some(team_context(user, team_id, project))
            }
            None => {
                tracing::info!(team_id = %team_id, "Team has no selectable project");
                Some(SessionContext::team_only(&user.id, team_id))
            }
        }
    }

    fn latest_write(&self) -> MutexGuard<'_, PendingWrite> {
        self.latest_write
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Brings record and URL in line with `context` unless a newer cycle
    /// has started since `generation`.
    async fn write(&self, generation: Generation, context: Option<SessionContext>) {
        let current = self.machine.lock().await.generation();
        if current != generation {
            tracing::debug!(generation, current, "Dropping superseded write");
            return;
        }
        {
            let mut latest = self.latest_write();
            if latest.generation > generation {
                tracing::debug!(generation, latest = latest.generation, "Dropping superseded write");
                return;
            }
            *latest = PendingWrite {
                seq: latest.seq + 1,
                generation,
                context,
            };
        }

        loop {
            let target = self.latest_write().clone();
            match &target.context {
                Some(context) => self.commit(context).await,
                None => self.purge().await,
            }
            // A newer write may have landed while this one was out.
            if self.latest_write().seq == target.seq {
                break;
            }
            tracing::debug!(generation = target.generation, "Re-applying newer write");
        }
    }

    async fn commit(&self, context: &SessionContext) {
        if let Err(e) = self.store.save(context).await {
            tracing::warn!(error = %e, "Failed to persist context record");
        }

        let params = UrlParams::for_context(context);
        if self.navigator.current() != params {
            self.navigator.replace(&params);
        }

        tracing::info!(
            user_id = %context.user_id,
            project_id = ?context.project_id,
            team_id = ?context.team_id,
            workspace = %context.workspace_kind,
            "Context settled"
        );
    }

    async fn purge(&self) {
        if let Err(e) = self.store.purge().await {
            tracing::warn!(error = %e, "Failed to purge context record");
        }
        if !self.navigator.current().is_empty() {
            self.navigator.replace(&UrlParams::default());
        }
    }
}

fn team_context(user: &SessionUser, team_id: &str, project: &ProjectSummary) -> SessionContext {
    let team = project.team().or_else(|| Some(team_id.to_string()));
    if project.is_personal {
        SessionContext::personal(&user.id, project.id.as_str(), team)
    } else {
        SessionContext::team_project(&user.id, project.id.as_str(), team)
    }
}
