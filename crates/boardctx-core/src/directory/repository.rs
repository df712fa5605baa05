//! Remote directory trait.

use async_trait::async_trait;

use crate::directory::model::{ProjectSummary, TeamLinkStatus};
use crate::error::Result;

/// Read-only view of the backend's project directory.
///
/// Implementations report a deleted project as [`ContextError::NotFound`],
/// a project the user cannot see as [`ContextError::Forbidden`] and any
/// other failure as [`ContextError::TransientNetwork`]. The context engine
/// never calls mutating endpoints.
///
/// [`ContextError::NotFound`]: crate::error::ContextError::NotFound
/// [`ContextError::Forbidden`]: crate::error::ContextError::Forbidden
/// [`ContextError::TransientNetwork`]: crate::error::ContextError::TransientNetwork
#[async_trait]
pub trait RemoteDirectory: Send + Sync {
    /// Fetches a single project.
    async fn get_project_by_id(&self, project_id: &str) -> Result<ProjectSummary>;

    /// Lists the projects a team exposes (the team's allowlist).
    ///
    /// Personal workspaces are never part of this list.
    async fn get_projects_by_team(&self, team_id: &str) -> Result<Vec<ProjectSummary>>;

    /// Fetches the signed-in user's personal workspace, if any.
    async fn get_personal_workspace(&self) -> Result<Option<ProjectSummary>>;

    /// Lists the user's projects that have no team assigned.
    async fn get_projects_without_team(&self) -> Result<Vec<ProjectSummary>>;

    /// Asks whether a project still has to be linked to a team.
    async fn get_project_needs_team_link(&self, project_id: &str) -> Result<TeamLinkStatus>;
}
