//! Arpin CLI - headless replay and configuration for the placement pipeline

#![warn(missing_docs)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod scenario;

#[derive(Parser)]
#[command(name = "arpin")]
#[command(about = "Tap-to-place AR pipeline tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, env = "ARPIN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted scenario through the simulated session and print each tick
    Replay {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Write the configuration to this file instead of printing it
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    // Load configuration
    let config = arpin_core::config::load_config(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Replay { scenario } => commands::replay::execute(&config, &scenario)?,
        Commands::Config { write } => commands::config::execute(&config, write)?,
    }

    Ok(())
}
