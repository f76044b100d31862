//! Stargauge CLI - command-line interface for the data pipeline.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stargauge")]
#[command(version)]
#[command(about = "Collects and shapes high-star repository metadata for visualization")]
#[command(
    long_about = "Stargauge fetches public repository metadata from the GitHub search API, \
filtered by a star-count threshold, and writes two flat CSV files: a raw file with the \
wire representation and a processed file with canonical types and derived popularity \
metrics, consumed by an external visualization tool."
)]
#[command(after_long_help = r#"EXAMPLES
    Fetch the current high-star leaderboard into the raw data file:
        $ stargauge fetch

    Fetch with a custom threshold and page budget:
        $ stargauge fetch --min-stars 50000 --max-pages 5

    Normalize the raw file into the processed file:
        $ stargauge process

    Both stages in one invocation:
        $ stargauge run

    Generate shell completions:
        $ stargauge completions bash > ~/.local/share/bash-completion/completions/stargauge

CONFIGURATION
    Stargauge reads configuration from:
      1. ~/.config/stargauge/config.toml (or $XDG_CONFIG_HOME/stargauge/config.toml)
      2. ./stargauge.toml
      3. Environment variables (STARGAUGE_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    GITHUB_TOKEN                GitHub personal access token
    STARGAUGE_GITHUB_TOKEN      Same, scoped to this tool (wins over config file)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options for the collection stage.
#[derive(Debug, Clone, clap::Args)]
struct FetchArgs {
    /// Minimum star count for inclusion (default from config or 27500)
    #[arg(short = 's', long)]
    min_stars: Option<u64>,

    /// Results per page, capped at 100 by the endpoint
    #[arg(short = 'p', long)]
    page_size: Option<u32>,

    /// Maximum pages to fetch in one sweep
    #[arg(short = 'm', long)]
    max_pages: Option<u32>,

    /// Output path for the raw data file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

/// Options for the transform stage.
#[derive(Debug, Clone, clap::Args)]
struct ProcessArgs {
    /// Input path (the raw data file)
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Output path for the processed data file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Reference instant for age-derived columns (RFC 3339, defaults to now)
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch repository metadata into the raw data file
    Fetch {
        #[command(flatten)]
        fetch_opts: FetchArgs,
    },
    /// Normalize the raw data file into the processed data file
    Process {
        #[command(flatten)]
        process_opts: ProcessArgs,
    },
    /// Fetch then process in one invocation
    Run {
        #[command(flatten)]
        fetch_opts: FetchArgs,

        /// Output path for the processed data file
        #[arg(long)]
        processed_output: Option<PathBuf>,

        /// Reference instant for age-derived columns (RFC 3339, defaults to now)
        #[arg(long)]
        as_of: Option<DateTime<Utc>>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging only when not attached to a terminal; interactive
    // runs get progress bars instead.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("stargauge=info,stargauge_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    match cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
        Commands::Fetch { fetch_opts } => {
            commands::fetch::handle_fetch(&fetch_opts, &config).await?;
        }
        Commands::Process { process_opts } => {
            commands::process::handle_process(&process_opts, &config)?;
        }
        Commands::Run {
            fetch_opts,
            processed_output,
            as_of,
        } => {
            let raw_path = commands::fetch::handle_fetch(&fetch_opts, &config).await?;
            if let Some(input) = raw_path {
                let process_opts = ProcessArgs {
                    input: Some(input),
                    output: processed_output,
                    as_of,
                };
                commands::process::handle_process(&process_opts, &config)?;
            }
        }
    }

    Ok(())
}
