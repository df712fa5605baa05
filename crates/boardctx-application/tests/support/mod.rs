#![allow(dead_code)]

use async_trait::async_trait;
use boardctx_application::SessionContextController;
use boardctx_core::config::ResolutionSettings;
use boardctx_core::context::{PersistedContextRecord, SessionUser};
use boardctx_core::directory::{ProjectSummary, RemoteDirectory, TeamLinkStatus};
use boardctx_core::error::{ContextError, Result};
use boardctx_core::store::{ContextSlot, PersistedContextStore};
use boardctx_infrastructure::{MemoryContextSlot, MemoryNavigator};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Scriptable directory that counts project lookups.
#[derive(Default)]
pub struct MockDirectory {
    pub projects: Mutex<Vec<ProjectSummary>>,
    pub personal: Option<ProjectSummary>,
    pub forbidden: Vec<String>,
    pub transient: Mutex<Vec<String>>,
    pub orphans: Mutex<Vec<ProjectSummary>>,
    pub listing_error: Mutex<Option<ContextError>>,
    pub needs_link: Vec<String>,
    pub gated: Option<(String, Arc<Notify>)>,
    lookups: Mutex<HashMap<String, usize>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, id: &str, team: Option<&str>) -> Self {
        self.projects
            .lock()
            .unwrap()
            .push(ProjectSummary::new(id, team, id.to_uppercase()));
        self
    }

    pub fn with_personal(mut self, id: &str, team: Option<&str>) -> Self {
        self.personal = Some(ProjectSummary::personal(id, team, "Personal"));
        self
    }

    pub fn with_forbidden(mut self, id: &str) -> Self {
        self.forbidden.push(id.to_string());
        self
    }

    pub fn with_transient(self, id: &str) -> Self {
        self.transient.lock().unwrap().push(id.to_string());
        self
    }

    pub fn with_orphan(self, id: &str) -> Self {
        self.orphans
            .lock()
            .unwrap()
            .push(ProjectSummary::new(id, None, "Orphan"));
        self
    }

    pub fn with_listing_error(self, error: ContextError) -> Self {
        *self.listing_error.lock().unwrap() = Some(error);
        self
    }

    pub fn with_needs_link(mut self, id: &str) -> Self {
        self.needs_link.push(id.to_string());
        self
    }

    /// Lookups of `id` wait until `notify` fires.
    pub fn gated(mut self, id: &str, notify: Arc<Notify>) -> Self {
        self.gated = Some((id.to_string(), notify));
        self
    }

    pub fn lookups(&self, id: &str) -> usize {
        self.lookups.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    fn find(&self, id: &str) -> Option<ProjectSummary> {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .chain(self.personal.iter())
            .find(|p| p.id == id)
            .cloned()
    }
}

#[async_trait]
impl RemoteDirectory for MockDirectory {
    async fn get_project_by_id(&self, project_id: &str) -> Result<ProjectSummary> {
        *self
            .lookups
            .lock()
            .unwrap()
            .entry(project_id.to_string())
            .or_default() += 1;

        if let Some((id, notify)) = &self.gated {
            if id == project_id {
                notify.notified().await;
            }
        }
        if self.transient.lock().unwrap().iter().any(|id| id == project_id) {
            return Err(ContextError::transient("directory timed out"));
        }
        if self.forbidden.iter().any(|id| id == project_id) {
            return Err(ContextError::forbidden(project_id));
        }
        self.find(project_id)
            .ok_or_else(|| ContextError::not_found("project", project_id))
    }

    async fn get_projects_by_team(&self, team_id: &str) -> Result<Vec<ProjectSummary>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| !p.is_personal && p.team().as_deref() == Some(team_id))
            .cloned()
            .collect())
    }

    async fn get_personal_workspace(&self) -> Result<Option<ProjectSummary>> {
        Ok(self.personal.clone())
    }

    async fn get_projects_without_team(&self) -> Result<Vec<ProjectSummary>> {
        if let Some(e) = self.listing_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.orphans.lock().unwrap().clone())
    }

    async fn get_project_needs_team_link(&self, project_id: &str) -> Result<TeamLinkStatus> {
        Ok(TeamLinkStatus {
            needs_link: self.needs_link.iter().any(|id| id == project_id),
            project: self.find(project_id),
        })
    }
}

/// Memory slot whose first write parks until `release` fires.
#[derive(Default)]
pub struct StallingSlot {
    inner: MemoryContextSlot,
    /// Fires once the first write is parked.
    pub stalled: Notify,
    pub release: Notify,
    done_stalling: AtomicBool,
}

impl StallingSlot {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextSlot for StallingSlot {
    async fn read(&self) -> Result<Option<PersistedContextRecord>> {
        self.inner.read().await
    }

    async fn write(&self, record: PersistedContextRecord) -> Result<()> {
        if !self.done_stalling.swap(true, Ordering::SeqCst) {
            self.stalled.notify_one();
            self.release.notified().await;
        }
        self.inner.write(record).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}

pub struct Harness {
    pub controller: SessionContextController,
    pub directory: Arc<MockDirectory>,
    pub slot: Arc<dyn ContextSlot>,
    pub navigator: Arc<MemoryNavigator>,
}

impl Harness {
    pub fn new(directory: MockDirectory, query: &str) -> Self {
        Self::with_slot(directory, query, Arc::new(MemoryContextSlot::new()))
    }

    pub fn with_record(directory: MockDirectory, query: &str, record: PersistedContextRecord) -> Self {
        Self::with_slot(
            directory,
            query,
            Arc::new(MemoryContextSlot::with_record(record)),
        )
    }

    pub fn with_slot(directory: MockDirectory, query: &str, slot: Arc<dyn ContextSlot>) -> Self {
        let directory = Arc::new(directory);
        let navigator = Arc::new(MemoryNavigator::new(query));
        let controller = SessionContextController::new(
            directory.clone(),
            PersistedContextStore::new(slot.clone()),
            navigator.clone(),
            &ResolutionSettings::default(),
        );
        Self {
            controller,
            directory,
            slot,
            navigator,
        }
    }

    pub async fn record(&self) -> Option<PersistedContextRecord> {
        self.slot.read().await.unwrap()
    }
}

pub fn user(id: &str, teams: &[&str]) -> SessionUser {
    SessionUser::new(id, teams.iter().map(|t| t.to_string()).collect())
}

pub fn record(user_id: &str, project: &str, team: Option<&str>) -> PersistedContextRecord {
    PersistedContextRecord {
        user_id: user_id.to_string(),
        team_id: team.map(str::to_string),
        project_id: Some(project.to_string()),
        workspace: None,
        updated_at: None,
    }
}
