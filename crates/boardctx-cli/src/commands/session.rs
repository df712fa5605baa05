use anyhow::{Context, Result};
use boardctx_application::bootstrap::file_backed_controller;
use boardctx_application::{ContextSnapshot, SessionContextController};
use boardctx_core::config::RootConfig;
use boardctx_core::context::SessionUser;
use boardctx_infrastructure::{MemoryNavigator, StaticDirectory};
use serde::Serialize;
use std::sync::Arc;

use crate::SessionArgs;

pub enum Target {
    Project {
        project_id: String,
        team_id: Option<String>,
    },
    Team(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    snapshot: ContextSnapshot,
    /// The URL query after the cycle.
    url: String,
}

struct Session {
    controller: SessionContextController,
    navigator: Arc<MemoryNavigator>,
    user: SessionUser,
}

async fn open(config: &RootConfig, args: &SessionArgs) -> Result<Session> {
    let directory = StaticDirectory::from_file(&args.directory)
        .await
        .with_context(|| format!("Failed to load directory fixture {}", args.directory.display()))?;
    let navigator = Arc::new(MemoryNavigator::new(args.url.as_str()));
    let controller = file_backed_controller(config, Arc::new(directory), navigator.clone())?;

    Ok(Session {
        controller,
        navigator,
        user: SessionUser::new(args.user.as_str(), args.teams.clone()),
    })
}

fn print(session: &Session, snapshot: ContextSnapshot) -> Result<()> {
    let report = Report {
        snapshot,
        url: session.navigator.query(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub async fn resolve(config: &RootConfig, args: &SessionArgs) -> Result<()> {
    let session = open(config, args).await?;
    let snapshot = session.controller.mount(session.user.clone()).await;
    print(&session, snapshot)
}

pub async fn switch(config: &RootConfig, args: &SessionArgs, target: Target) -> Result<()> {
    let session = open(config, args).await?;
    let mounted = session.controller.mount(session.user.clone()).await;
    if mounted.is_blocked() {
        tracing::warn!(
            orphans = mounted.blocked_orphans.len(),
            "Switch ignored until orphan projects are linked"
        );
        return print(&session, mounted);
    }

    let snapshot = match target {
        Target::Project {
            project_id,
            team_id,
        } => {
            session
                .controller
                .switch_project(&project_id, team_id.as_deref())
                .await
        }
        Target::Team(team_id) => session.controller.switch_team(&team_id).await,
    };
    print(&session, snapshot)
}
