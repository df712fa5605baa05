//! Orphan project gating.
//!
//! While the user owns projects without a team, navigation is suspended
//! until every one of them is linked. The decision is pure; the listing
//! itself is fetched by the application layer.

use crate::directory::model::ProjectSummary;
use crate::error::Result;

/// Signal published by the orphan link gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateSignal {
    /// Normal navigation may proceed.
    Clear,
    /// Navigation is suspended until these projects are linked.
    Blocked(Vec<ProjectSummary>),
}

impl GateSignal {
    /// Builds the signal from a "projects without team" listing.
    ///
    /// A failed listing fails open: a transient error must never lock the
    /// user out of the product.
    pub fn from_listing(listing: Result<Vec<ProjectSummary>>) -> Self {
        match listing {
            Ok(projects) => {
                let orphans: Vec<ProjectSummary> =
                    projects.into_iter().filter(ProjectSummary::is_orphan).collect();
                if should_block(&orphans) {
                    GateSignal::Blocked(orphans)
                } else {
                    GateSignal::Clear
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Orphan listing failed, not blocking navigation");
                GateSignal::Clear
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, GateSignal::Blocked(_))
    }
}

/// Returns `true` when any of `projects` still needs a team.
pub fn should_block(projects: &[ProjectSummary]) -> bool {
    projects.iter().any(ProjectSummary::is_orphan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;

    #[test]
    fn test_blocks_on_orphans() {
        let signal = GateSignal::from_listing(Ok(vec![ProjectSummary::new("p1", None, "Leads")]));
        assert!(signal.is_blocked());
    }

    #[test]
    fn test_clear_on_empty_listing() {
        assert_eq!(GateSignal::from_listing(Ok(vec![])), GateSignal::Clear);
    }

    #[test]
    fn test_fails_open() {
        let signal = GateSignal::from_listing(Err(ContextError::transient("timeout")));
        assert_eq!(signal, GateSignal::Clear);
    }

    #[test]
    fn test_ignores_personal_and_linked_entries() {
        let listing = vec![
            ProjectSummary::personal("pw1", None, "Mine"),
            ProjectSummary::new("p2", Some("t1"), "Linked meanwhile"),
        ];
        assert!(!should_block(&listing));
        assert_eq!(GateSignal::from_listing(Ok(listing)), GateSignal::Clear);
    }
}
