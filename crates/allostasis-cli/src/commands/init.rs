//! Write a default allostasis.toml.

use anyhow::{Context, Result};
use allostasis::prelude::SimulationConfig;
use colored::Colorize;
use std::path::PathBuf;

use crate::config;

pub fn run(path: Option<PathBuf>, force: bool) -> Result<()> {
    let base_path = match path {
        Some(p) => p,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Allostasis project...", "→".blue());

    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("Failed to create {}", base_path.display()))?;

    let config_path = config::config_path(&base_path);
    if config_path.exists() && !force {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    } else {
        config::save(&SimulationConfig::default(), &config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    }

    println!();
    println!("{} Ready.", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} edit {}", "1.".blue(), config_path.display());
    println!("  {} allostasis run --ticks 1000", "2.".blue());
    println!("  {} allostasis-web --port 5000", "3.".blue());

    Ok(())
}
