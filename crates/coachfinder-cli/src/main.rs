mod auth;
mod centers;
mod search;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use auth::AuthCommands;
use centers::CenterArgs;

#[derive(Debug, Parser)]
#[command(name = "coachfinder-cli")]
#[command(about = "Coachfinder location search and center lookup")]
struct Cli {
    /// Print machine-readable JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search locations by free text
    Search {
        /// Query text; multiple words are joined with spaces
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// List places near a coordinate, nearest first
    Nearby {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Search radius in kilometres (defaults to the configured radius)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Read queries from stdin as if typed, printing results as they settle
    Interactive,
    /// Filter and sort coaching centers from a JSON file
    Centers {
        /// JSON array of coaching centers
        file: PathBuf,
        #[command(flatten)]
        args: CenterArgs,
    },
    /// Inspect or clear the stored sign-in session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = coachfinder_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, search = ?config.search, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Search { query }) => {
            search::run_search(&config.search, &query.join(" "), cli.json).await?;
        }
        Some(Commands::Nearby { lat, lon, radius }) => {
            search::run_nearby(&config.search, lat, lon, radius, cli.json).await?;
        }
        Some(Commands::Interactive) => search::run_interactive(&config.search, cli.json).await?,
        Some(Commands::Centers { file, args }) => centers::run_centers(&file, &args, cli.json)?,
        Some(Commands::Auth { command }) => auth::run_auth(&config.store_path, &command, cli.json)?,
        None => println!("coachfinder-cli ready; run with --help for commands"),
    }

    Ok(())
}
