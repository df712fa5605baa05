//! Candidate context resolution.
//!
//! Pure and synchronous: given what the URL, the persisted record and the
//! remote lookups currently say, pick the context to validate next.
//!
//! Project precedence, first usable id wins:
//!
//! 1. URL `projectId` (or `workspace=personal`)
//! 2. persisted record of the live user
//! 3. the user's personal workspace
//!
//! Team precedence: URL `teamId`, persisted `teamId`, the transient
//! server-resolved team id, then the personal workspace's team when the
//! candidate is the personal workspace.

use serde::Serialize;
use strum::Display;

use crate::context::model::{
    PersistedContextRecord, SessionContext, SessionUser, UrlParams, WorkspaceKind,
};
use crate::directory::model::ProjectSummary;
use crate::ids::clean_id;

/// Everything the resolver looks at.
#[derive(Debug, Clone, Copy)]
pub struct ResolverInput<'a> {
    pub user: &'a SessionUser,
    pub url: &'a UrlParams,
    pub persisted: Option<&'a PersistedContextRecord>,
    /// Team id the server resolved earlier in this session. Never persisted.
    pub transient_team_id: Option<&'a str>,
    pub personal_workspace: Option<&'a ProjectSummary>,
    /// Project ids that already failed validation in the current cycle.
    pub rejected: &'a [String],
}

/// Which source produced the candidate project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CandidateSource {
    Url,
    Persisted,
    PersonalWorkspace,
}

/// What the resolver decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A project to validate.
    Resolved {
        context: SessionContext,
        source: CandidateSource,
    },
    /// No project is known but the user has teams; the caller should take
    /// the first project of `team_id`'s allowlist.
    NeedsTeamProjectLookup { team_id: String },
    /// Nothing to select.
    None,
}

/// Computes the candidate context.
pub fn resolve(input: &ResolverInput<'_>) -> Candidate {
    let user_id = input.user.id.as_str();
    let persisted = input.persisted.filter(|record| record.belongs_to(user_id));
    let personal_id = input
        .personal_workspace
        .and_then(|workspace| clean_id(Some(workspace.id.as_str())));
    let usable = |id: Option<String>| id.filter(|id| !input.rejected.contains(id));

    let picked = usable(clean_id(input.url.project_id.as_deref()))
        .map(|id| (id, CandidateSource::Url))
        .or_else(|| {
            (input.url.workspace == Some(WorkspaceKind::Personal))
                .then(|| usable(personal_id.clone()))
                .flatten()
                .map(|id| (id, CandidateSource::Url))
        })
        .or_else(|| {
            usable(persisted.and_then(|record| clean_id(record.project_id.as_deref())))
                .map(|id| (id, CandidateSource::Persisted))
        })
        .or_else(|| {
            usable(personal_id.clone()).map(|id| (id, CandidateSource::PersonalWorkspace))
        });

    let team_hint = clean_id(input.url.team_id.as_deref())
        .or_else(|| persisted.and_then(|record| clean_id(record.team_id.as_deref())))
        .or_else(|| clean_id(input.transient_team_id));

    let Some((project_id, source)) = picked else {
        let member_hint = team_hint.filter(|team| input.user.team_ids.contains(team));
        return match member_hint.or_else(|| input.user.first_team().map(str::to_string)) {
            Some(team_id) => Candidate::NeedsTeamProjectLookup { team_id },
            None => Candidate::None,
        };
    };

    let is_personal = personal_id.as_deref() == Some(project_id.as_str());
    let context = if is_personal {
        let personal_team = input
            .personal_workspace
            .and_then(|workspace| clean_id(workspace.team_id.as_deref()));
        SessionContext::personal(user_id, project_id, team_hint.or(personal_team))
    } else {
        SessionContext::team_project(user_id, project_id, team_hint)
    };

    Candidate::Resolved { context, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, teams: &[&str]) -> SessionUser {
        SessionUser::new(id, teams.iter().map(|t| t.to_string()).collect())
    }

    fn record(user_id: &str, project: Option<&str>, team: Option<&str>) -> PersistedContextRecord {
        PersistedContextRecord {
            user_id: user_id.to_string(),
            team_id: team.map(str::to_string),
            project_id: project.map(str::to_string),
            workspace: None,
            updated_at: None,
        }
    }

    fn input<'a>(
        user: &'a SessionUser,
        url: &'a UrlParams,
        persisted: Option<&'a PersistedContextRecord>,
        personal: Option<&'a ProjectSummary>,
    ) -> ResolverInput<'a> {
        ResolverInput {
            user,
            url,
            persisted,
            transient_team_id: None,
            personal_workspace: personal,
            rejected: &[],
        }
    }

    fn resolved(candidate: Candidate) -> (SessionContext, CandidateSource) {
        match candidate {
            Candidate::Resolved { context, source } => (context, source),
            other => panic!("expected a resolved candidate, got {:?}", other),
        }
    }

    #[test]
    fn test_url_beats_persisted() {
        let u = user("u1", &["t1"]);
        let url = UrlParams::from_query("projectId=p1&teamId=t1");
        let rec = record("u1", Some("p2"), Some("t2"));

        let (context, source) = resolved(resolve(&input(&u, &url, Some(&rec), None)));
        assert_eq!(context.project_id.as_deref(), Some("p1"));
        assert_eq!(context.team_id.as_deref(), Some("t1"));
        assert_eq!(source, CandidateSource::Url);
    }

    #[test]
    fn test_url_sentinel_equals_absent() {
        let u = user("u1", &["t1"]);
        let rec = record("u1", Some("p2"), Some("t2"));
        let sentinel = UrlParams::from_query("projectId=undefined");
        let absent = UrlParams::default();

        assert_eq!(
            resolve(&input(&u, &sentinel, Some(&rec), None)),
            resolve(&input(&u, &absent, Some(&rec), None))
        );
    }

    #[test]
    fn test_persisted_sentinel_is_skipped() {
        let u = user("u1", &[]);
        let url = UrlParams::default();
        let rec = record("u1", Some("undefined"), Some("null"));
        let personal = ProjectSummary::personal("pw1", None, "Mine");

        let (context, source) = resolved(resolve(&input(&u, &url, Some(&rec), Some(&personal))));
        assert_eq!(context.project_id.as_deref(), Some("pw1"));
        assert_eq!(source, CandidateSource::PersonalWorkspace);
    }

    #[test]
    fn test_team_filled_from_transient_memory() {
        let u = user("u1", &["t1"]);
        let url = UrlParams::from_query("projectId=p1");
        let mut inp = input(&u, &url, None, None);
        inp.transient_team_id = Some("t7");

        let (context, _) = resolved(resolve(&inp));
        assert_eq!(context.team_id.as_deref(), Some("t7"));
    }

    #[test]
    fn test_personal_workspace_fallback() {
        let u = user("u1", &["t1"]);
        let url = UrlParams::default();
        let personal = ProjectSummary::personal("pw1", Some("t1"), "Mine");

        let (context, source) = resolved(resolve(&input(&u, &url, None, Some(&personal))));
        assert_eq!(context.project_id.as_deref(), Some("pw1"));
        assert_eq!(context.team_id.as_deref(), Some("t1"));
        assert_eq!(context.workspace_kind, WorkspaceKind::Personal);
        assert_eq!(source, CandidateSource::PersonalWorkspace);
    }

    #[test]
    fn test_url_workspace_flag_selects_personal() {
        let u = user("u1", &[]);
        let url = UrlParams::from_query("workspace=personal");
        let rec = record("u1", Some("p2"), None);
        let personal = ProjectSummary::personal("pw1", None, "Mine");

        let (context, source) = resolved(resolve(&input(&u, &url, Some(&rec), Some(&personal))));
        assert_eq!(context.project_id.as_deref(), Some("pw1"));
        assert!(context.is_personal());
        assert_eq!(source, CandidateSource::Url);
    }

    #[test]
    fn test_foreign_record_is_ignored() {
        let u = user("u2", &[]);
        let url = UrlParams::default();
        let rec = record("u1", Some("p9"), Some("t3"));

        assert_eq!(resolve(&input(&u, &url, Some(&rec), None)), Candidate::None);
    }

    #[test]
    fn test_needs_lookup_for_first_team() {
        let u = user("u1", &["t1", "t2"]);
        let url = UrlParams::default();

        assert_eq!(
            resolve(&input(&u, &url, None, None)),
            Candidate::NeedsTeamProjectLookup {
                team_id: "t1".to_string()
            }
        );
    }

    #[test]
    fn test_lookup_prefers_named_member_team() {
        let u = user("u1", &["t1", "t2"]);
        let url = UrlParams::from_query("teamId=t2");

        assert_eq!(
            resolve(&input(&u, &url, None, None)),
            Candidate::NeedsTeamProjectLookup {
                team_id: "t2".to_string()
            }
        );
    }

    #[test]
    fn test_rejected_ids_are_skipped() {
        let u = user("u1", &[]);
        let url = UrlParams::from_query("projectId=p1");
        let personal = ProjectSummary::personal("pw1", None, "Mine");
        let rejected = vec!["p1".to_string()];
        let mut inp = input(&u, &url, None, Some(&personal));
        inp.rejected = &rejected;

        let (context, _) = resolved(resolve(&inp));
        assert_eq!(context.project_id.as_deref(), Some("pw1"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let u = user("u1", &["t1"]);
        let url = UrlParams::from_query("teamId=t1");
        let rec = record("u1", Some("p4"), None);
        let personal = ProjectSummary::personal("pw1", Some("t1"), "Mine");
        let inp = input(&u, &url, Some(&rec), Some(&personal));

        assert_eq!(resolve(&inp), resolve(&inp));
    }
}
