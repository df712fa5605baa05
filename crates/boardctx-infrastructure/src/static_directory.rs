//! Fixture-backed `RemoteDirectory`.
//!
//! Serves a project directory from a JSON document:
//!
//! ```json
//! {
//!   "projects": [{ "id": "p1", "teamId": "t1", "name": "Pipeline" }],
//!   "personalWorkspace": { "id": "pw1", "isPersonal": true, "name": "Mine" },
//!   "forbiddenProjectIds": ["p9"]
//! }
//! ```

use async_trait::async_trait;
use boardctx_core::directory::{ProjectSummary, RemoteDirectory, TeamLinkStatus};
use boardctx_core::error::{ContextError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of a directory fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryFixture {
    #[serde(default)]
    pub projects: Vec<ProjectSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_workspace: Option<ProjectSummary>,
    /// Projects that exist but the user may not open.
    #[serde(default)]
    pub forbidden_project_ids: Vec<String>,
}

/// Read-only directory over a [`DirectoryFixture`].
#[derive(Debug, Default)]
pub struct StaticDirectory {
    fixture: DirectoryFixture,
}

impl StaticDirectory {
    pub fn new(fixture: DirectoryFixture) -> Self {
        Self { fixture }
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            ContextError::config(format!("Cannot read directory fixture {}: {}", path.display(), e))
        })?;
        let fixture: DirectoryFixture = serde_json::from_str(&content)?;
        tracing::debug!(
            projects = fixture.projects.len(),
            personal = fixture.personal_workspace.is_some(),
            "Loaded directory fixture"
        );
        Ok(Self::new(fixture))
    }
}

fn find<'a>(fixture: &'a DirectoryFixture, project_id: &str) -> Option<&'a ProjectSummary> {
    fixture
        .projects
        .iter()
        .chain(fixture.personal_workspace.iter())
        .find(|p| p.id == project_id)
}

#[async_trait]
impl RemoteDirectory for StaticDirectory {
    async fn get_project_by_id(&self, project_id: &str) -> Result<ProjectSummary> {
        let fixture = &self.fixture;
        if fixture.forbidden_project_ids.iter().any(|id| id == project_id) {
            return Err(ContextError::forbidden(format!(
                "project '{}' is not visible to this user",
                project_id
            )));
        }
        find(fixture, project_id)
            .cloned()
            .ok_or_else(|| ContextError::not_found("project", project_id))
    }

    async fn get_projects_by_team(&self, team_id: &str) -> Result<Vec<ProjectSummary>> {
        let fixture = &self.fixture;
        Ok(fixture
            .projects
            .iter()
            .filter(|p| !p.is_personal && p.team().as_deref() == Some(team_id))
            .filter(|p| !fixture.forbidden_project_ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn get_personal_workspace(&self) -> Result<Option<ProjectSummary>> {
        Ok(self.fixture.personal_workspace.clone())
    }

    async fn get_projects_without_team(&self) -> Result<Vec<ProjectSummary>> {
        Ok(self
            .fixture
            .projects
            .iter()
            .filter(|p| p.is_orphan())
            .cloned()
            .collect())
    }

    async fn get_project_needs_team_link(&self, project_id: &str) -> Result<TeamLinkStatus> {
        let project = find(&self.fixture, project_id)
            .cloned()
            .ok_or_else(|| ContextError::not_found("project", project_id))?;
        Ok(TeamLinkStatus {
            needs_link: project.is_orphan(),
            project: Some(project),
        })
    }
}
