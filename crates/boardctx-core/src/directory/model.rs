//! Read-only project models served by the remote directory.

use serde::{Deserialize, Serialize};

use crate::ids::clean_owned;

/// A project ("funnel") as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default)]
    pub is_personal: bool,
    #[serde(default)]
    pub name: String,
}

impl ProjectSummary {
    pub fn new(id: impl Into<String>, team_id: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            team_id: team_id.map(str::to_string),
            is_personal: false,
            name: name.into(),
        }
    }

    pub fn personal(id: impl Into<String>, team_id: Option<&str>, name: impl Into<String>) -> Self {
        Self {
            is_personal: true,
            ..Self::new(id, team_id, name)
        }
    }

    /// The team id with sentinel values removed.
    pub fn team(&self) -> Option<String> {
        clean_owned(self.team_id.clone())
    }

    /// A non-personal project without a team.
    pub fn is_orphan(&self) -> bool {
        !self.is_personal && self.team().is_none()
    }
}

/// Answer of the per-project "needs team link" query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLinkStatus {
    pub needs_link: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_detection() {
        assert!(ProjectSummary::new("p1", None, "Leads").is_orphan());
        assert!(ProjectSummary::new("p2", Some("undefined"), "Leads").is_orphan());
        assert!(!ProjectSummary::new("p3", Some("t1"), "Leads").is_orphan());
        assert!(!ProjectSummary::personal("pw1", None, "Mine").is_orphan());
    }

    #[test]
    fn test_deserialize_backend_payload() {
        let json = r#"{"id":"p1","teamId":"t1","isPersonal":false,"name":"Pipeline"}"#;
        let project: ProjectSummary = serde_json::from_str(json).unwrap();
        assert_eq!(project.team().as_deref(), Some("t1"));
        assert!(!project.is_personal);
    }
}
