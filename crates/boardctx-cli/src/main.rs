use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "boardctx")]
#[command(about = "boardctx CLI - resolve the team/project context of a board session", long_about = None)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Persisted context file, overrides the config
    #[arg(long, global = true)]
    context_file: Option<PathBuf>,

    /// Log filter, overrides the config (RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit JSON log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every command that runs a resolution cycle.
#[derive(Args, Clone)]
pub struct SessionArgs {
    /// Directory fixture (JSON) standing in for the backend
    #[arg(long)]
    directory: PathBuf,

    /// Signed-in user id
    #[arg(long)]
    user: String,

    /// Team memberships of the user, in display order
    #[arg(long = "team")]
    teams: Vec<String>,

    /// Current URL query string
    #[arg(long, default_value = "")]
    url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and validate the context for a session
    Resolve {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Resolve, then switch to another project or team
    Switch {
        #[command(flatten)]
        session: SessionArgs,

        /// Project to switch to
        #[arg(long, conflicts_with = "to_team", required_unless_present = "to_team")]
        project: Option<String>,

        /// Team of the project to switch to
        #[arg(long, requires = "project")]
        project_team: Option<String>,

        /// Team to switch to (lands on its first project)
        #[arg(long)]
        to_team: Option<String>,
    },
    /// Print the persisted context record
    Show,
    /// Delete the persisted context record
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = commands::load_config(cli.config.as_deref())?;
    if let Some(path) = cli.context_file {
        config.storage.context_file = Some(path);
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    logging::init(&config.logging);

    match cli.command {
        Commands::Resolve { session } => commands::session::resolve(&config, &session).await?,
        Commands::Switch {
            session,
            project,
            project_team,
            to_team,
        } => {
            let target = match (project, to_team) {
                (Some(project), _) => commands::session::Target::Project {
                    project_id: project,
                    team_id: project_team,
                },
                (None, Some(team_id)) => commands::session::Target::Team(team_id),
                (None, None) => anyhow::bail!("either --project or --to-team is required"),
            };
            commands::session::switch(&config, &session, target).await?
        }
        Commands::Show => commands::record::show(&config).await?,
        Commands::Clear => commands::record::clear(&config).await?,
    }

    Ok(())
}
