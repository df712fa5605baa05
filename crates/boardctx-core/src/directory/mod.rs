pub mod model;
pub mod repository;

pub use model::{ProjectSummary, TeamLinkStatus};
pub use repository::RemoteDirectory;
