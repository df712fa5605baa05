//! Validation gate.
//!
//! Checks a candidate context against the remote directory and turns the
//! answers into a [`ValidationOutcome`]. Concurrent validations of the same
//! project id share one request. The request is dropped once nobody waits
//! on it, so a cancelled caller never leaves a stale entry behind.

use boardctx_core::context::SessionContext;
use boardctx_core::directory::{ProjectSummary, RemoteDirectory};
use boardctx_core::error::{ContextError, Result};
use boardctx_core::ids::clean_id;
use boardctx_core::validation::ValidationOutcome;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type SharedValidation = Shared<BoxFuture<'static, Result<ValidationOutcome>>>;
type InFlight = Mutex<HashMap<String, SharedValidation>>;

pub struct ValidationGate {
    directory: Arc<dyn RemoteDirectory>,
    /// In-flight validations keyed by project id. Never held across an
    /// await.
    in_flight: InFlight,
}

impl ValidationGate {
    pub fn new(directory: Arc<dyn RemoteDirectory>) -> Self {
        Self {
            directory,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct project ids with a request out.
    pub fn in_flight(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Validates `candidate`.
    ///
    /// `Err` means no verdict could be reached (the project lookup failed
    /// for a reason other than not-found/forbidden). Callers must not write
    /// anything in that case.
    pub async fn validate(&self, candidate: &SessionContext) -> Result<ValidationOutcome> {
        let Some(project_id) = clean_id(candidate.project_id.as_deref()) else {
            return Err(ContextError::invariant(
                "validation requested for a context without a project",
            ));
        };

        let mut waiter = {
            let mut in_flight = lock(&self.in_flight);
            let request = match in_flight.get(&project_id) {
                Some(existing) => {
                    tracing::debug!(project_id = %project_id, "Coalescing validation request");
                    existing.clone()
                }
                None => {
                    let directory = Arc::clone(&self.directory);
                    let candidate = candidate.clone();
                    let id = project_id.clone();
                    let request = async move { check(directory.as_ref(), &id, &candidate).await }
                        .boxed()
                        .shared();
                    in_flight.insert(project_id.clone(), request.clone());
                    request
                }
            };
            Waiter {
                in_flight: &self.in_flight,
                project_id,
                request,
                finished: false,
            }
        };

        let result = waiter.request.clone().await;
        waiter.finished = true;
        result
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, SharedValidation>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One caller's interest in a shared request.
///
/// Dropping it removes the map entry when the request finished, or when
/// this was the last caller still waiting on it.
struct Waiter<'a> {
    in_flight: &'a InFlight,
    project_id: String,
    request: SharedValidation,
    finished: bool,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        let mut in_flight = lock(self.in_flight);
        let ours = in_flight
            .get(&self.project_id)
            .is_some_and(|current| Shared::ptr_eq(current, &self.request));
        if !ours {
            return;
        }

        // The map entry, this handle and the clone being polled.
        let abandoned = self.request.strong_count().is_some_and(|count| count <= 3);
        if self.finished || abandoned {
            if !self.finished {
                tracing::debug!(project_id = %self.project_id, "Dropping abandoned validation request");
            }
            in_flight.remove(&self.project_id);
        }
    }
}

async fn check(
    directory: &dyn RemoteDirectory,
    project_id: &str,
    candidate: &SessionContext,
) -> Result<ValidationOutcome> {
    let project = match directory.get_project_by_id(project_id).await {
        Ok(project) => project,
        Err(e) if e.is_not_found() => return Ok(ValidationOutcome::not_found()),
        Err(e) if e.is_forbidden() => return Ok(ValidationOutcome::forbidden()),
        Err(e) => return Err(e),
    };
    let candidate_team = clean_id(candidate.team_id.as_deref());

    if project.is_personal {
        return Ok(ValidationOutcome::confirmed(
            &project,
            candidate_team.or_else(|| project.team()),
        ));
    }

    let Some(team_id) = project.team().or(candidate_team) else {
        return Ok(match directory.get_project_needs_team_link(project_id).await {
            Ok(status) if status.needs_link => {
                tracing::info!(project_id = %project_id, "Project has to be linked to a team");
                ValidationOutcome::needs_team_link()
            }
            Ok(_) => ValidationOutcome::confirmed(&project, None),
            Err(e) => {
                tracing::warn!(
                    project_id = %project_id,
                    error = %e,
                    "Team link query failed, accepting project without team"
                );
                ValidationOutcome::confirmed(&project, None)
            }
        });
    };

    let allowlist = match directory.get_projects_by_team(&team_id).await {
        Ok(projects) => projects,
        Err(e) if e.is_not_found() => return Ok(ValidationOutcome::not_found()),
        Err(e) => {
            tracing::warn!(team_id = %team_id, error = %e, "Team allowlist unavailable");
            return Ok(ValidationOutcome::forbidden());
        }
    };

    if allowlist.iter().any(|entry| entry.id == project.id) {
        return Ok(ValidationOutcome::confirmed(&project, Some(team_id)));
    }

    Ok(ValidationOutcome::corrected(correction(
        &candidate.user_id,
        &team_id,
        &allowlist,
    )))
}

/// First usable allowlist entry, or the bare team when there is none.
fn correction(user_id: &str, team_id: &str, allowlist: &[ProjectSummary]) -> SessionContext {
    let first = allowlist
        .iter()
        .find_map(|entry| clean_id(Some(entry.id.as_str())).map(|id| (id, entry)));

    match first {
        Some((id, entry)) => {
            let team = entry.team().or_else(|| Some(team_id.to_string()));
            if entry.is_personal {
                SessionContext::personal(user_id, id, team)
            } else {
                SessionContext::team_project(user_id, id, team)
            }
        }
        None => SessionContext::team_only(user_id, team_id),
    }
}
