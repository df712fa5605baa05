//! URL navigation trait.

use crate::context::model::UrlParams;

/// Read/write access to the context part of the current URL.
///
/// `replace` swaps the URL in place without adding a history entry.
pub trait UrlNavigator: Send + Sync {
    fn current(&self) -> UrlParams;

    fn replace(&self, params: &UrlParams);
}
