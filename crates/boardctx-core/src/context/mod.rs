pub mod model;

pub use model::{
    PersistedContextRecord, SessionContext, SessionUser, UrlParams, WorkspaceKind, query_keys,
};
