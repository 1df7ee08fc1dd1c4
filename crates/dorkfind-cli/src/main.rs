//! # Dorkfind CLI
//!
//! Command-line interface for the Dorkfind dork search tool.
//!
//! ## Commands
//!
//! - `dorkfind serve` - Run the HTTP search endpoint
//! - `dorkfind query <text>` - Search once and print the matches
//! - `dorkfind interactive` - Search as you type in a terminal UI
//!
//! ## Example Usage
//!
//! ```bash
//! # Serve the configured store (seed file or PostgREST table)
//! dorkfind serve --bind 127.0.0.1:8787
//!
//! # One-shot search against the running server
//! dorkfind query "inurl:admin" --endpoint http://127.0.0.1:8787
//!
//! # Interactive search
//! dorkfind interactive
//! ```

mod app;
mod commands;
mod tui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Dorkfind - search stored dork queries as you type
#[derive(Parser)]
#[command(name = "dorkfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP search endpoint
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(short, long, env = "DORKFIND_BIND")]
        bind: Option<String>,
    },

    /// Search once and print the matching records
    Query {
        /// Text to look for in stored dork queries (case-insensitive, literal)
        text: String,

        /// Base URL of a running search endpoint (default: search in-process)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Search as you type in a terminal UI
    #[command(alias = "i")]
    Interactive {
        /// Base URL of a running search endpoint (default: search in-process)
        #[arg(short, long)]
        endpoint: Option<String>,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => dorkfind_core::Config::load_from(path)?,
        None => dorkfind_core::Config::load()?,
    };
    config.apply_env_overrides();

    // Setup logging; the TUI owns the terminal, so it only logs errors by default
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 if matches!(cli.command, Commands::Interactive { .. }) => "error".to_string(),
            0 => config.general.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)))
        .init();

    // Execute command
    match cli.command {
        Commands::Serve { bind } => commands::serve::run(config, bind),
        Commands::Query {
            text,
            endpoint,
            output,
        } => commands::query::run(config, &text, endpoint, output),
        Commands::Interactive { endpoint } => tui::run(config, endpoint),
    }
}
