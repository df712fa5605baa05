//! Context domain models.
//!
//! `SessionContext` is the authoritative (team, project) selection for a
//! signed-in user. `PersistedContextRecord` is its durable mirror and
//! `UrlParams` is its projection onto the navigable URL.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::ids::{clean_id, clean_owned};

/// Which kind of workspace a context points at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WorkspaceKind {
    /// A project owned by one of the user's teams.
    Team,
    /// The user's personal, team-independent project.
    Personal,
    /// Nothing selected.
    #[default]
    None,
}

/// The signed-in user as seen by the context engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    /// Teams the user belongs to, in display order.
    #[serde(default)]
    pub team_ids: Vec<String>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>, team_ids: Vec<String>) -> Self {
        Self {
            id: id.into(),
            team_ids: team_ids.into_iter().filter_map(|t| clean_owned(Some(t))).collect(),
        }
    }

    /// The first team the user belongs to, if any.
    pub fn first_team(&self) -> Option<&str> {
        self.team_ids.first().map(String::as_str)
    }
}

/// The resolved (team, project) selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub workspace_kind: WorkspaceKind,
}

impl SessionContext {
    /// A context with nothing selected.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            team_id: None,
            project_id: None,
            workspace_kind: WorkspaceKind::None,
        }
    }

    /// A team project selection. A placeholder project id leaves nothing
    /// selected.
    pub fn team_project(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        team_id: Option<String>,
    ) -> Self {
        Self::selection(user_id, project_id, team_id, WorkspaceKind::Team)
    }

    /// The user's personal workspace. `team_id` may still be present.
    pub fn personal(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        team_id: Option<String>,
    ) -> Self {
        Self::selection(user_id, project_id, team_id, WorkspaceKind::Personal)
    }

    fn selection(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        team_id: Option<String>,
        kind: WorkspaceKind,
    ) -> Self {
        let project_id = clean_owned(Some(project_id.into()));
        Self {
            user_id: user_id.into(),
            team_id: clean_owned(team_id),
            workspace_kind: if project_id.is_some() {
                kind
            } else {
                WorkspaceKind::None
            },
            project_id,
        }
    }

    /// A team is known but no project in it is usable.
    pub fn team_only(user_id: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self {
            team_id: clean_owned(Some(team_id.into())),
            ..Self::empty(user_id)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
    }

    pub fn is_personal(&self) -> bool {
        self.workspace_kind == WorkspaceKind::Personal
    }

    /// Returns a copy with a different team id.
    pub fn with_team(&self, team_id: Option<String>) -> Self {
        Self {
            team_id: clean_owned(team_id),
            ..self.clone()
        }
    }
}

/// Durable mirror of the last settled context.
///
/// A record only ever belongs to `user_id`; stores purge it as soon as a
/// different user asks for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedContextRecord {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<WorkspaceKind>,
    /// RFC 3339 timestamp of the write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PersistedContextRecord {
    /// Builds the record for a settled context.
    pub fn from_context(context: &SessionContext) -> Self {
        Self {
            user_id: context.user_id.clone(),
            team_id: context.team_id.clone(),
            project_id: context.project_id.clone(),
            workspace: Some(context.workspace_kind),
            updated_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Drops sentinel ids written by older clients.
    pub fn sanitized(self) -> Self {
        Self {
            team_id: clean_owned(self.team_id),
            project_id: clean_owned(self.project_id),
            ..self
        }
    }

    pub fn belongs_to(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// Query parameter names owned by the context engine.
pub mod query_keys {
    pub const TEAM_ID: &str = "teamId";
    pub const PROJECT_ID: &str = "projectId";
    pub const WORKSPACE: &str = "workspace";
}

/// The context-related part of the URL query.
///
/// Values are always sanitized: a parameter whose value is a sentinel is
/// indistinguishable from an absent one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlParams {
    pub team_id: Option<String>,
    pub project_id: Option<String>,
    /// Only `personal` is ever written.
    pub workspace: Option<WorkspaceKind>,
}

impl UrlParams {
    /// Parses the context parameters out of a raw query string.
    ///
    /// A leading `?` is accepted. Unknown parameters are ignored.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                query_keys::TEAM_ID => params.team_id = clean_id(Some(&*value)),
                query_keys::PROJECT_ID => params.project_id = clean_id(Some(&*value)),
                query_keys::WORKSPACE => {
                    params.workspace = value
                        .parse::<WorkspaceKind>()
                        .ok()
                        .filter(|kind| *kind == WorkspaceKind::Personal)
                }
                _ => {}
            }
        }
        params
    }

    /// The parameters that represent a settled context.
    pub fn for_context(context: &SessionContext) -> Self {
        Self {
            team_id: clean_owned(context.team_id.clone()),
            project_id: clean_owned(context.project_id.clone()),
            workspace: context.is_personal().then_some(WorkspaceKind::Personal),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.team_id.is_none() && self.project_id.is_none() && self.workspace.is_none()
    }

    /// Rewrites `query`, replacing the context parameters and keeping every
    /// other pair in its original order.
    pub fn apply_to_query(&self, query: &str) -> String {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if !matches!(
                &*key,
                query_keys::TEAM_ID | query_keys::PROJECT_ID | query_keys::WORKSPACE
            ) {
                serializer.append_pair(&key, &value);
            }
        }
        if let Some(team_id) = clean_id(self.team_id.as_deref()) {
            serializer.append_pair(query_keys::TEAM_ID, &team_id);
        }
        if let Some(project_id) = clean_id(self.project_id.as_deref()) {
            serializer.append_pair(query_keys::PROJECT_ID, &project_id);
        }
        if self.workspace == Some(WorkspaceKind::Personal) {
            serializer.append_pair(query_keys::WORKSPACE, "personal");
        }
        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_sentinels_read_as_absent() {
        let params = UrlParams::from_query("?projectId=undefined&teamId=null");
        assert_eq!(params, UrlParams::default());
    }

    #[test]
    fn test_url_round_trip_keeps_foreign_params() {
        let ctx = SessionContext::personal("u1", "pw1", Some("t1".to_string()));
        let query = UrlParams::for_context(&ctx).apply_to_query("view=kanban&projectId=old");
        assert_eq!(query, "view=kanban&teamId=t1&projectId=pw1&workspace=personal");

        let parsed = UrlParams::from_query(&query);
        assert_eq!(parsed.project_id.as_deref(), Some("pw1"));
        assert_eq!(parsed.workspace, Some(WorkspaceKind::Personal));
    }

    #[test]
    fn test_empty_params_strip_context_keys() {
        let query = UrlParams::default().apply_to_query("teamId=t1&projectId=p1&q=x");
        assert_eq!(query, "q=x");
    }

    #[test]
    fn test_workspace_param_only_accepts_personal() {
        assert_eq!(UrlParams::from_query("workspace=team").workspace, None);
        assert_eq!(
            UrlParams::from_query("workspace=Personal").workspace,
            Some(WorkspaceKind::Personal)
        );
    }

    #[test]
    fn test_placeholder_project_selects_nothing() {
        let ctx = SessionContext::team_project("u1", "undefined", Some("t1".to_string()));
        assert!(ctx.is_empty());
        assert_eq!(ctx.workspace_kind, WorkspaceKind::None);
        assert_eq!(ctx.team_id.as_deref(), Some("t1"));

        let ctx = SessionContext::personal("u1", " ", None);
        assert_eq!(ctx, SessionContext::empty("u1"));
    }

    #[test]
    fn test_record_sanitizes_sentinels() {
        let record = PersistedContextRecord {
            user_id: "u1".to_string(),
            team_id: Some("undefined".to_string()),
            project_id: Some("p1".to_string()),
            workspace: None,
            updated_at: None,
        }
        .sanitized();
        assert_eq!(record.team_id, None);
        assert_eq!(record.project_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let ctx = SessionContext::team_project("u1", "p1", Some("t1".to_string()));
        let json = serde_json::to_value(PersistedContextRecord::from_context(&ctx)).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["projectId"], "p1");
        assert_eq!(json["workspace"], "team");
    }
}
