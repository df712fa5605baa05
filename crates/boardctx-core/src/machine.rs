//! Session context state machine.
//!
//! [`ContextMachine::apply`] is a reducer over `(state, event)`. It never
//! performs I/O; it returns the [`Effect`]s the caller has to execute and
//! feeds the results back as new events.
//!
//! ```text
//! Uninitialized -> Initializing -> CandidateResolved -> Validating -> Settled
//!                                        ^                  |
//!                                        +-- Invalidated <--+  (NotFound / Forbidden)
//! ```
//!
//! Every user-initiated switch bumps the generation. Results tagged with an
//! older generation, or for a project that is no longer being validated,
//! are dropped without touching any state. Writes carry the generation they
//! were decided in so the executor can drop them once superseded.

use serde::Serialize;
use strum::Display;

use crate::context::model::{SessionContext, SessionUser};
use crate::directory::model::ProjectSummary;
use crate::error::ContextError;
use crate::ids::clean_owned;
use crate::orphan::GateSignal;
use crate::validation::{ValidationOutcome, ValidationStatus};

pub type Generation = u64;

/// Coarse state name, suitable for snapshots and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Uninitialized,
    Initializing,
    CandidateResolved,
    Validating,
    Settled,
    Invalidated,
    Blocked,
}

/// Why a context stopped being trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum InvalidationReason {
    NotFound,
    Forbidden,
    TeamSwitch,
    ProjectDeleted,
    AccessRevoked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    Initializing,
    CandidateResolved { candidate: SessionContext },
    Validating { candidate: SessionContext },
    Settled { context: SessionContext },
    Invalidated { reason: InvalidationReason },
    Blocked { orphans: Vec<ProjectSummary> },
}

impl ContextState {
    pub fn phase(&self) -> Phase {
        match self {
            ContextState::Uninitialized => Phase::Uninitialized,
            ContextState::Initializing => Phase::Initializing,
            ContextState::CandidateResolved { .. } => Phase::CandidateResolved,
            ContextState::Validating { .. } => Phase::Validating,
            ContextState::Settled { .. } => Phase::Settled,
            ContextState::Invalidated { .. } => Phase::Invalidated,
            ContextState::Blocked { .. } => Phase::Blocked,
        }
    }
}

/// Where resolution should take its inputs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveMode {
    /// URL, persisted record and remote lookups.
    Restore,
    /// Remote lookups only; URL and record were just purged.
    FreshSlate,
    /// First allowlisted project of the given team.
    Team(String),
}

/// Transient memory handed to the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveHints {
    pub transient_team_id: Option<String>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEvent {
    /// Mount, refresh, or a new authenticated user.
    Mount { user: SessionUser },
    /// Logout.
    UserCleared,
    /// Result of an [`Effect::Resolve`].
    Resolved {
        generation: Generation,
        gate: GateSignal,
        personal_workspace_id: Option<String>,
        candidate: Option<SessionContext>,
    },
    /// The caller is about to validate the current candidate.
    ValidationDispatched {
        generation: Generation,
        project_id: String,
    },
    ValidationFinished {
        generation: Generation,
        project_id: String,
        outcome: ValidationOutcome,
    },
    /// Validation could not reach a verdict (transient failure).
    ValidationFailed {
        generation: Generation,
        project_id: String,
        error: ContextError,
    },
    /// User picked a project.
    SelectProject {
        project_id: Option<String>,
        team_id: Option<String>,
    },
    /// User switched to another team.
    SwitchTeam { team_id: String },
    /// A mismatch was detected outside the machine.
    Invalidate { reason: InvalidationReason },
    /// The orphan link gate changed its mind.
    GateChanged { signal: GateSignal },
}

impl ContextEvent {
    /// Short name used in log spans.
    pub fn kind(&self) -> &'static str {
        match self {
            ContextEvent::Mount { .. } => "mount",
            ContextEvent::UserCleared => "user_cleared",
            ContextEvent::Resolved { .. } => "resolved",
            ContextEvent::ValidationDispatched { .. } => "validation_dispatched",
            ContextEvent::ValidationFinished { .. } => "validation_finished",
            ContextEvent::ValidationFailed { .. } => "validation_failed",
            ContextEvent::SelectProject { .. } => "select_project",
            ContextEvent::SwitchTeam { .. } => "switch_team",
            ContextEvent::Invalidate { .. } => "invalidate",
            ContextEvent::GateChanged { .. } => "gate_changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Gather inputs and resolve a candidate, answering with
    /// [`ContextEvent::Resolved`].
    Resolve {
        generation: Generation,
        user: SessionUser,
        mode: ResolveMode,
        hints: ResolveHints,
    },
    /// Announce validation with [`ContextEvent::ValidationDispatched`].
    Validate {
        generation: Generation,
        candidate: SessionContext,
    },
    /// Call the validation gate, answering with
    /// [`ContextEvent::ValidationFinished`] or [`ContextEvent::ValidationFailed`].
    RunValidation {
        generation: Generation,
        candidate: SessionContext,
    },
    /// Write the settled context to the persisted record and the URL.
    Commit {
        generation: Generation,
        context: SessionContext,
    },
    /// Purge the persisted record and strip context parameters from the URL.
    Purge { generation: Generation },
    /// Re-run the orphan listing and report through
    /// [`ContextEvent::GateChanged`].
    RefreshGate,
}

/// The controller's whole mutable state.
#[derive(Debug, Clone)]
pub struct ContextMachine {
    state: ContextState,
    user: Option<SessionUser>,
    generation: Generation,
    max_recoveries: u8,
    recoveries: u8,
    rejected: Vec<String>,
    transient_team_id: Option<String>,
    personal_workspace_id: Option<String>,
    /// Project id and generation of the validation request whose answer
    /// is awaited.
    in_flight: Option<(String, Generation)>,
    last_error: Option<ContextError>,
}

impl ContextMachine {
    pub fn new(max_recoveries: u8) -> Self {
        Self {
            state: ContextState::Uninitialized,
            user: None,
            generation: 0,
            max_recoveries,
            recoveries: 0,
            rejected: Vec::new(),
            transient_team_id: None,
            personal_workspace_id: None,
            in_flight: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> &ContextState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// The settled context, if the machine is settled.
    pub fn settled_context(&self) -> Option<&SessionContext> {
        match &self.state {
            ContextState::Settled { context } => Some(context),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&ContextError> {
        self.last_error.as_ref()
    }

    pub fn blocked_orphans(&self) -> &[ProjectSummary] {
        match &self.state {
            ContextState::Blocked { orphans } => orphans,
            _ => &[],
        }
    }

    /// `true` while a context is being resolved or validated.
    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            ContextState::Initializing
                | ContextState::CandidateResolved { .. }
                | ContextState::Validating { .. }
                | ContextState::Invalidated { .. }
        )
    }

    /// Applies one event and returns the effects to execute, in order.
    pub fn apply(&mut self, event: ContextEvent) -> Vec<Effect> {
        match event {
            ContextEvent::Mount { user } => self.on_mount(user),
            ContextEvent::UserCleared => self.on_user_cleared(),
            ContextEvent::Resolved {
                generation,
                gate,
                personal_workspace_id,
                candidate,
            } => self.on_resolved(generation, gate, personal_workspace_id, candidate),
            ContextEvent::ValidationDispatched {
                generation,
                project_id,
            } => self.on_validation_dispatched(generation, project_id),
            ContextEvent::ValidationFinished {
                generation,
                project_id,
                outcome,
            } => self.on_validation_finished(generation, project_id, outcome),
            ContextEvent::ValidationFailed {
                generation,
                project_id,
                error,
            } => self.on_validation_failed(generation, project_id, error),
            ContextEvent::SelectProject {
                project_id,
                team_id,
            } => self.on_select_project(project_id, team_id),
            ContextEvent::SwitchTeam { team_id } => self.on_switch_team(team_id),
            ContextEvent::Invalidate { reason } => self.on_invalidate(reason),
            ContextEvent::GateChanged { signal } => self.on_gate_changed(signal),
        }
    }

    // ============================================================================
    // Transitions
    // ============================================================================

    fn on_mount(&mut self, user: SessionUser) -> Vec<Effect> {
        let same_user = self.user.as_ref().is_some_and(|u| u.id == user.id);
        if !same_user {
            self.transient_team_id = None;
            self.personal_workspace_id = None;
        }
        self.user = Some(user);
        self.start_cycle();
        self.state = ContextState::Initializing;
        self.resolve_effect(ResolveMode::Restore).into_iter().collect()
    }

    fn on_user_cleared(&mut self) -> Vec<Effect> {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::new(self.max_recoveries)
        };
        Vec::new()
    }

    fn on_resolved(
        &mut self,
        generation: Generation,
        gate: GateSignal,
        personal_workspace_id: Option<String>,
        candidate: Option<SessionContext>,
    ) -> Vec<Effect> {
        let accepting = matches!(
            self.state,
            ContextState::Initializing | ContextState::Invalidated { .. }
        );
        if generation != self.generation || !accepting {
            tracing::debug!(
                generation,
                current = self.generation,
                "Discarding stale resolution"
            );
            return Vec::new();
        }
        let Some(user) = self.user.as_ref() else {
            return Vec::new();
        };

        let empty = SessionContext::empty(&user.id);
        self.personal_workspace_id = clean_owned(personal_workspace_id);

        if let GateSignal::Blocked(orphans) = gate {
            tracing::info!(
                orphans = orphans.len(),
                "Navigation suspended until orphan projects are linked"
            );
            self.state = ContextState::Blocked { orphans };
            return Vec::new();
        }

        let candidate = candidate.unwrap_or(empty);
        self.state = ContextState::CandidateResolved {
            candidate: candidate.clone(),
        };
        if candidate.is_empty() {
            self.state = ContextState::Settled { context: candidate };
            return Vec::new();
        }
        vec![Effect::Validate {
            generation,
            candidate,
        }]
    }

    fn on_validation_dispatched(
        &mut self,
        generation: Generation,
        project_id: String,
    ) -> Vec<Effect> {
        if generation != self.generation {
            return Vec::new();
        }
        let candidate = match &self.state {
            ContextState::CandidateResolved { candidate }
                if candidate.project_id.as_deref() == Some(project_id.as_str()) =>
            {
                candidate.clone()
            }
            _ => return Vec::new(),
        };
        self.state = ContextState::Validating {
            candidate: candidate.clone(),
        };

        // Only the newest dispatch is answered. A request still out for the
        // same project is not sent twice: the gate folds this one into it.
        if self
            .in_flight
            .as_ref()
            .is_some_and(|(id, _)| *id == project_id)
        {
            tracing::debug!(project_id = %project_id, generation, "Taking over in-flight validation");
        }

        self.in_flight = Some((project_id, generation));
        vec![Effect::RunValidation {
            generation,
            candidate,
        }]
    }

    fn on_validation_finished(
        &mut self,
        generation: Generation,
        project_id: String,
        outcome: ValidationOutcome,
    ) -> Vec<Effect> {
        let Some(candidate) = self.accept_result(generation, &project_id) else {
            return Vec::new();
        };

        match outcome.status {
            ValidationStatus::NotFound => self.recover(project_id, InvalidationReason::NotFound),
            ValidationStatus::Forbidden => {
                self.recover(project_id, InvalidationReason::Forbidden)
            }
            ValidationStatus::Valid | ValidationStatus::NeedsTeamLink => {
                let Some(context) = outcome.settled_context(&candidate) else {
                    return Vec::new();
                };
                if outcome.is_corrected() {
                    tracing::info!(
                        requested = %project_id,
                        corrected = ?context.project_id,
                        team_id = ?context.team_id,
                        "Project not in team allowlist, using corrected context"
                    );
                }
                self.settle(context.clone());

                let mut effects = vec![Effect::Commit {
                    generation: self.generation,
                    context,
                }];
                if outcome.status == ValidationStatus::NeedsTeamLink {
                    effects.push(Effect::RefreshGate);
                }
                effects
            }
        }
    }

    fn on_validation_failed(
        &mut self,
        generation: Generation,
        project_id: String,
        error: ContextError,
    ) -> Vec<Effect> {
        let Some(candidate) = self.accept_result(generation, &project_id) else {
            return Vec::new();
        };
        tracing::warn!(
            project_id = %project_id,
            error = %error,
            "Validation failed without a verdict, leaving persisted state untouched"
        );
        self.last_error = Some(error);
        self.state = ContextState::Settled {
            context: SessionContext::empty(&candidate.user_id),
        };
        Vec::new()
    }

    fn on_select_project(
        &mut self,
        project_id: Option<String>,
        team_id: Option<String>,
    ) -> Vec<Effect> {
        let Some(user) = self.user.clone() else {
            return Vec::new();
        };
        if matches!(self.state, ContextState::Blocked { .. }) {
            tracing::warn!("Ignoring project switch while orphan projects are unlinked");
            return Vec::new();
        }

        let team_id = clean_owned(team_id);
        let candidate = match clean_owned(project_id) {
            Some(id) if self.personal_workspace_id.as_deref() == Some(id.as_str()) => {
                SessionContext::personal(&user.id, id, team_id.clone())
            }
            Some(id) => SessionContext::team_project(&user.id, id, team_id.clone()),
            None => SessionContext::empty(&user.id),
        };

        if let ContextState::Settled { context } = &self.state {
            let same_team = team_id.is_none() || context.team_id == candidate.team_id;
            if !candidate.is_empty() && context.project_id == candidate.project_id && same_team {
                return Vec::new();
            }
        }

        self.start_cycle();
        self.state = ContextState::CandidateResolved {
            candidate: candidate.clone(),
        };
        if candidate.is_empty() {
            self.state = ContextState::Settled { context: candidate };
            return Vec::new();
        }
        vec![Effect::Validate {
            generation: self.generation,
            candidate,
        }]
    }

    fn on_switch_team(&mut self, team_id: String) -> Vec<Effect> {
        if self.user.is_none() || matches!(self.state, ContextState::Blocked { .. }) {
            return Vec::new();
        }
        let Some(team_id) = clean_owned(Some(team_id)) else {
            return Vec::new();
        };
        self.start_cycle();
        self.transient_team_id = None;
        self.state = ContextState::Invalidated {
            reason: InvalidationReason::TeamSwitch,
        };
        self.resolve_effect(ResolveMode::Team(team_id))
            .into_iter()
            .collect()
    }

    fn on_invalidate(&mut self, reason: InvalidationReason) -> Vec<Effect> {
        if self.user.is_none() || matches!(self.state, ContextState::Blocked { .. }) {
            return Vec::new();
        }
        self.start_cycle();
        self.transient_team_id = None;
        self.state = ContextState::Invalidated { reason };
        let mut effects = vec![Effect::Purge {
            generation: self.generation,
        }];
        effects.extend(self.resolve_effect(ResolveMode::FreshSlate));
        effects
    }

    fn on_gate_changed(&mut self, signal: GateSignal) -> Vec<Effect> {
        if self.user.is_none() {
            return Vec::new();
        }
        match signal {
            GateSignal::Blocked(orphans) => {
                // Anything still in flight belongs to a context that no
                // longer matters.
                self.generation += 1;
                self.state = ContextState::Blocked { orphans };
                Vec::new()
            }
            GateSignal::Clear => {
                if !matches!(self.state, ContextState::Blocked { .. }) {
                    return Vec::new();
                }
                tracing::info!("Orphan projects linked, resuming resolution");
                self.start_cycle();
                self.state = ContextState::Initializing;
                self.resolve_effect(ResolveMode::Restore)
                    .into_iter()
                    .collect()
            }
        }
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    fn start_cycle(&mut self) {
        self.generation += 1;
        self.recoveries = 0;
        self.rejected.clear();
        self.last_error = None;
        self.in_flight = None;
    }

    fn resolve_effect(&self, mode: ResolveMode) -> Option<Effect> {
        let user = self.user.clone()?;
        Some(Effect::Resolve {
            generation: self.generation,
            user,
            mode,
            hints: ResolveHints {
                transient_team_id: self.transient_team_id.clone(),
                rejected: self.rejected.clone(),
            },
        })
    }

    /// Matches a validation result against the request that is out and the
    /// candidate being validated. Returns the candidate when the result
    /// still applies.
    fn accept_result(&mut self, generation: Generation, project_id: &str) -> Option<SessionContext> {
        let owns_request = self
            .in_flight
            .as_ref()
            .is_some_and(|(id, issued)| id == project_id && *issued == generation);
        if !owns_request {
            tracing::debug!(
                project_id = %project_id,
                generation,
                "Discarding superseded validation result"
            );
            return None;
        }
        self.in_flight = None;

        match &self.state {
            ContextState::Validating { candidate }
                if candidate.project_id.as_deref() == Some(project_id) =>
            {
                Some(candidate.clone())
            }
            _ => {
                tracing::debug!(
                    project_id = %project_id,
                    phase = %self.phase(),
                    "Validation result no longer applies"
                );
                None
            }
        }
    }

    fn settle(&mut self, context: SessionContext) {
        if context.team_id.is_some() {
            self.transient_team_id = context.team_id.clone();
        }
        self.state = ContextState::Settled { context };
    }

    fn recover(&mut self, project_id: String, reason: InvalidationReason) -> Vec<Effect> {
        self.rejected.push(project_id.clone());
        self.transient_team_id = None;

        if self.recoveries >= self.max_recoveries {
            let error = ContextError::invariant(format!(
                "context did not converge after {} recoveries (last project '{}')",
                self.recoveries, project_id
            ));
            tracing::warn!(error = %error, "Settling empty context");
            self.last_error = Some(error);
            let user_id = self
                .user
                .as_ref()
                .map(|u| u.id.clone())
                .unwrap_or_default();
            self.state = ContextState::Settled {
                context: SessionContext::empty(user_id),
            };
            return vec![Effect::Purge {
                generation: self.generation,
            }];
        }

        tracing::info!(
            project_id = %project_id,
            reason = %reason,
            "Context invalidated, restarting resolution from an empty slate"
        );
        self.recoveries += 1;
        self.state = ContextState::Invalidated { reason };
        let mut effects = vec![Effect::Purge {
            generation: self.generation,
        }];
        effects.extend(self.resolve_effect(ResolveMode::FreshSlate));
        effects
    }
}

impl Default for ContextMachine {
    fn default() -> Self {
        Self::new(1)
    }
}
