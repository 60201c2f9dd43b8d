use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use lodestar_providers::{Config, Providers};

mod commands;
mod logging;

#[derive(Debug, Parser)]
#[command(name = "lodestar", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.config/lodestar/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Show an Astronomy Picture of the Day
    ///
    /// Without flags a random entry from the APOD archive is shown. Random
    /// entries are prefetched in batches, so repeated calls in a long-running
    /// session rarely wait on NASA.
    Apod {
        /// Show today's entry instead of a random one
        #[arg(long)]
        today: bool,
    },
    /// Show a random cat picture
    Cat,
    /// Show a random dog picture
    Dog,
    /// Show a random duck picture
    Duck,
    /// Look up a Pokémon, or show a random one
    Pokemon {
        /// Name or national dex number
        name: Option<String>,
    },
    /// List upcoming rocket launches
    Launches {
        /// How many launches to list (1-100)
        #[arg(
            long,
            default_value_t = 5,
            value_parser = clap::value_parser!(u16).range(1..=100)
        )]
        limit: u16,
    },
    /// Search YouTube for a video
    Youtube {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// List enabled content providers
    Sources,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(lodestar_providers::config::config_file_path);
    let config = Config::load_from(&config_path)?;

    logging::init(&config.logging, cli.verbose)?;

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => commands::config::show_config(&config, &config_path),
            ConfigAction::Path => commands::config::show_path(&config_path),
            ConfigAction::Example => commands::config::show_example(),
            ConfigAction::Init => commands::config::init_config(&config_path),
        };
    }

    let providers =
        Providers::from_config(&config).context("Failed to set up content providers")?;

    match cli.command {
        Commands::Apod { today } => commands::content::run_apod(&providers, today).await,
        Commands::Cat => commands::content::run_cat(&providers).await,
        Commands::Dog => commands::content::run_dog(&providers).await,
        Commands::Duck => commands::content::run_duck(&providers).await,
        Commands::Pokemon { name } => {
            commands::content::run_pokemon(&providers, name.as_deref()).await;
        }
        Commands::Launches { limit } => {
            commands::content::run_launches(&providers, usize::from(limit)).await;
        }
        Commands::Youtube { query } => {
            commands::content::run_youtube(&providers, &query.join(" ")).await;
        }
        Commands::Sources => commands::sources::show_sources(&providers, &config),
        Commands::Config { .. } => {}
    }

    Ok(())
}
