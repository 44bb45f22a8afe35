//! Auth Usage Dashboard - CLI entry point
//!
//! Fetches the usage document from a credential-proxy management API (or a
//! saved file) and prints per-credential statistics as JSON.

use auth_usage_dashboard::commands::{self, BarSelector, StatsQuery};
use auth_usage_dashboard::config::{default, loader, schema::Config, xdg};
use auth_usage_dashboard::logging;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Per-credential usage statistics
#[derive(Parser)]
#[command(name = "aud")]
#[command(version, about = "Per-credential usage statistics for a credential proxy")]
struct Cli {
    /// Configuration file (defaults to the XDG location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the aud CLI
#[derive(Subcommand)]
enum Commands {
    /// Print success/failure counters for the last 24 hours
    Stats {
        /// Credential index
        #[arg(long)]
        index: Option<String>,
        /// Credential identifier
        #[arg(long)]
        id: Option<String>,
        /// Source file name; `auth1.json` also matches `auth1`
        #[arg(long)]
        source: Option<String>,
        /// Read the usage document from a saved JSON file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the 48-slot status bar
    StatusBar {
        /// Credential index
        #[arg(long, conflicts_with = "id")]
        index: Option<String>,
        /// Credential identifier
        #[arg(long)]
        id: Option<String>,
        /// Read the usage document from a saved JSON file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Print one glyph per slot instead of JSON
        #[arg(long)]
        compact: bool,
    },

    /// Manage configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Actions for the `config` subcommand.
#[derive(Subcommand)]
enum ConfigAction {
    /// Create default configuration file (at `--config` when given)
    Init {
        /// Overwrite existing configuration (creates backup)
        #[arg(long)]
        force: bool,
    },
    /// Show configuration file path
    Path,
    /// Validate configuration file
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Commands::Config { action } = cli.command {
        return run_config_command(action, cli.config);
    }

    let config = match loader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.logging.level);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    rt.block_on(run_query_command(cli.command, &config))
}

async fn run_query_command(command: Commands, config: &Config) -> ExitCode {
    match command {
        Commands::Stats {
            index,
            id,
            source,
            file,
        } => {
            let store = match commands::load_store(config, file.as_deref()).await {
                Ok(store) => store,
                Err(e) => return report_error(&e),
            };
            let query = StatsQuery { index, id, source };
            print_json(&commands::stats_report(&store, &query))
        }
        Commands::StatusBar {
            index,
            id,
            file,
            compact,
        } => {
            let store = match commands::load_store(config, file.as_deref()).await {
                Ok(store) => store,
                Err(e) => return report_error(&e),
            };
            let selector = match (index, id) {
                (Some(index), _) => BarSelector::Index(index),
                (None, Some(id)) => BarSelector::Id(id),
                (None, None) => BarSelector::All,
            };
            let bar = commands::status_bar_report(&store, &selector);
            if compact {
                println!("{} {:.1}%", commands::render_blocks(&bar), bar.success_rate);
                ExitCode::SUCCESS
            } else {
                print_json(&bar)
            }
        }
        Commands::Config { .. } => ExitCode::SUCCESS,
    }
}

fn run_config_command(action: ConfigAction, path: Option<PathBuf>) -> ExitCode {
    let result = match action {
        ConfigAction::Init { force } => {
            default::create_default_config(path.as_deref(), force).map(|created| {
                if let Some(backup) = &created.backup {
                    println!("Backed up existing config to {}", backup.display());
                }
                println!("Created configuration at {}", created.path.display());
            })
        }
        ConfigAction::Path => {
            println!("{}", path.unwrap_or_else(xdg::config_path).display());
            Ok(())
        }
        ConfigAction::Validate => loader::load(path.as_deref()).map(|config| {
            println!("Configuration is valid");
            println!("{config:#?}");
        }),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Config error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to serialize output: {e}");
            ExitCode::FAILURE
        }
    }
}

fn report_error(e: &commands::CliError) -> ExitCode {
    eprintln!("Error: {e}");
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
    ExitCode::FAILURE
}
