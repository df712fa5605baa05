//! In-memory `UrlNavigator`.

use boardctx_core::context::UrlParams;
use boardctx_core::navigation::UrlNavigator;
use std::sync::Mutex;

/// Holds the current query string and rewrites it in place.
///
/// Only the context parameters are ever touched; anything else in the
/// query survives a `replace`.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    query: Mutex<String>,
    replacements: Mutex<usize>,
}

impl MemoryNavigator {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Mutex::new(query.into()),
            replacements: Mutex::new(0),
        }
    }

    /// The full current query string, without a leading `?`.
    pub fn query(&self) -> String {
        self.query.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Simulates the user editing the address bar.
    pub fn set_query(&self, query: impl Into<String>) {
        *self.query.lock().unwrap_or_else(|p| p.into_inner()) = query.into();
    }

    /// Number of `replace` calls so far.
    pub fn replacements(&self) -> usize {
        *self.replacements.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl UrlNavigator for MemoryNavigator {
    fn current(&self) -> UrlParams {
        UrlParams::from_query(&self.query())
    }

    fn replace(&self, params: &UrlParams) {
        let mut query = self.query.lock().unwrap_or_else(|p| p.into_inner());
        *query = params.apply_to_query(&query);
        *self.replacements.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        tracing::debug!(query = %*query, "URL replaced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardctx_core::context::SessionContext;

    #[test]
    fn test_replace_keeps_foreign_params() {
        let navigator = MemoryNavigator::new("?view=list&projectId=old");
        let context = SessionContext::team_project("u1", "p2", Some("t1".to_string()));

        navigator.replace(&UrlParams::for_context(&context));

        assert_eq!(navigator.query(), "view=list&teamId=t1&projectId=p2");
        assert_eq!(navigator.current().project_id.as_deref(), Some("p2"));
        assert_eq!(navigator.replacements(), 1);
    }

    #[test]
    fn test_replace_with_defaults_strips_context() {
        let navigator = MemoryNavigator::new("teamId=t1&projectId=p1");
        navigator.replace(&UrlParams::default());
        assert_eq!(navigator.query(), "");
        assert!(navigator.current().is_empty());
    }
}
