//! Allostasis Web API - serve a running world over HTTP.

use allostasis_runtime::config::{SimulationConfig, CONFIG_FILE_NAME};
use allostasis_runtime::scheduler::Scheduler;
use allostasis_runtime::simulation::Simulation;
use allostasis_runtime::sync::Synchronizer;
use allostasis_web::{routes, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "allostasis-web")]
#[command(about = "Allostasis Web API - observe and perturb a running world")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Path to allostasis.toml (searched in parent directories if omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the world seed
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            SimulationConfig::discover(&cwd)
        }
    };
    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            SimulationConfig::load(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?
        }
        None => {
            info!("no {} found, using defaults", CONFIG_FILE_NAME);
            SimulationConfig::default()
        }
    };
    if let Some(seed) = cli.seed {
        config.world.seed = seed;
    }
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let addr = format!("{}:{}", cli.host, cli.port);

    let simulation = Simulation::from_config(&config).context("Failed to build world")?;
    let sync = Arc::new(Synchronizer::new(simulation.snapshot()));
    let scheduler = Scheduler::new(simulation, Arc::clone(&sync), config.scheduler.clone());
    scheduler.start().context("Failed to start scheduler")?;

    let app = routes::create_router(AppState::new(sync));

    println!("Starting Allostasis Web API...");
    println!("State at http://{}/api/state", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped, stopping scheduler");
    let stopped = tokio::task::spawn_blocking(move || scheduler.shutdown()).await?;
    if let Some(simulation) = stopped? {
        info!(tick = simulation.tick(), "world stopped");
    }
    Ok(())
}
