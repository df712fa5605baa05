//! Validation outcome types.

use serde::Serialize;
use strum::Display;

use crate::context::model::{SessionContext, WorkspaceKind};
use crate::directory::model::ProjectSummary;

/// Verdict of a single validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum ValidationStatus {
    Valid,
    NotFound,
    Forbidden,
    NeedsTeamLink,
}

/// Result of validating one candidate context.
///
/// An outcome is applied as a whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub status: ValidationStatus,
    /// Replacement context when the candidate was not in the team allowlist.
    pub corrected_context: Option<SessionContext>,
    /// Team the project actually belongs to, as reported by the backend.
    pub confirmed_team_id: Option<String>,
    /// Whether the backend reports the project as a personal workspace.
    pub confirmed_personal: bool,
}

impl ValidationOutcome {
    /// The candidate is usable as-is, possibly under a different team.
    pub fn confirmed(project: &ProjectSummary, team_id: Option<String>) -> Self {
        Self {
            status: ValidationStatus::Valid,
            corrected_context: None,
            confirmed_team_id: team_id,
            confirmed_personal: project.is_personal,
        }
    }

    /// The candidate must be replaced by `context`.
    pub fn corrected(context: SessionContext) -> Self {
        Self {
            status: ValidationStatus::Valid,
            confirmed_team_id: context.team_id.clone(),
            confirmed_personal: context.is_personal(),
            corrected_context: Some(context),
        }
    }

    pub fn needs_team_link() -> Self {
        Self::with_status(ValidationStatus::NeedsTeamLink)
    }

    pub fn not_found() -> Self {
        Self::with_status(ValidationStatus::NotFound)
    }

    pub fn forbidden() -> Self {
        Self::with_status(ValidationStatus::Forbidden)
    }

    fn with_status(status: ValidationStatus) -> Self {
        Self {
            status,
            corrected_context: None,
            confirmed_team_id: None,
            confirmed_personal: false,
        }
    }

    pub fn is_corrected(&self) -> bool {
        self.corrected_context.is_some()
    }

    /// `NotFound` and `Forbidden` invalidate the candidate.
    pub fn requires_purge(&self) -> bool {
        matches!(
            self.status,
            ValidationStatus::NotFound | ValidationStatus::Forbidden
        )
    }

    /// The context to commit for `candidate`, or `None` when the outcome
    /// invalidates it.
    pub fn settled_context(&self, candidate: &SessionContext) -> Option<SessionContext> {
        if self.requires_purge() {
            return None;
        }
        if let Some(corrected) = &self.corrected_context {
            return Some(SessionContext {
                user_id: candidate.user_id.clone(),
                ..corrected.clone()
            });
        }

        let mut context = candidate.with_team(self.confirmed_team_id.clone());
        if !context.is_empty() {
            context.workspace_kind = if self.confirmed_personal {
                WorkspaceKind::Personal
            } else {
                WorkspaceKind::Team
            };
        }
        Some(context)
    }
}
