//! Allostasis CLI - run worlds headless and scaffold configuration.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "allostasis")]
#[command(author, version, about = "Allostasis - allostatic agents in a shared world", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to allostasis.toml (searched in parent directories if omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default allostasis.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run a world headless
    Run {
        /// Number of ticks to run
        #[arg(short, long, default_value = "500")]
        ticks: u64,

        /// Override the world seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the population size
        #[arg(long)]
        agents: Option<usize>,

        /// Drop food before the first tick, as "x,y" or "x,y,amount" (repeatable)
        #[arg(long = "drop", value_parser = config::parse_drop)]
        drops: Vec<config::DropSpec>,

        /// Print the final snapshot as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path, force } => commands::init::run(path, force),
        Commands::Run {
            ticks,
            seed,
            agents,
            drops,
            json,
        } => {
            let options = commands::run::RunOptions {
                ticks,
                seed,
                agents,
                drops,
                json,
                verbose: cli.verbose,
            };
            commands::run::run(cli.config.as_deref(), options)
        }
        Commands::Config => commands::show_config(cli.config.as_deref()),
    }
}
