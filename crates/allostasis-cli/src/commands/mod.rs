//! CLI command implementations.

pub mod init;
pub mod run;

use crate::config;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Print the configuration a run would use.
pub fn show_config(explicit: Option<&Path>) -> Result<()> {
    let (config, source) = config::load(explicit)?;
    match source {
        Some(path) => eprintln!("{} {}", "# from".dimmed(), path.display()),
        None => eprintln!("{}", "# built-in defaults".dimmed()),
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}
