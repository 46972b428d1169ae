//! Arcade CLI - Spawn, validate and list entity definitions

mod commands;

use anyhow::{Context, Result};
use arcade_factory::FactoryConfig;
use clap::{Parser, Subcommand};
use commands::{list, spawn, validate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arcade")]
#[command(about = "Data-driven entity factory for tile-based arcade games", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the factory config file
    #[arg(long, global = true, default_value = "arcade.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Spawn one archetype into an empty world and print its components
    Spawn {
        /// Archetype name (definition file stem)
        name: String,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Parse and spawn every definition, reporting skipped blocks
    Validate {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// List every archetype under the definitions directory
    List,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = FactoryConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    tracing::debug!(definitions = %config.definitions_dir.display(), "loaded config");

    match cli.command {
        Commands::Spawn { name, format } => spawn::run(&config, &name, &format),
        Commands::Validate { format } => validate::run(&config, &format),
        Commands::List => list::run(&config),
    }
}
