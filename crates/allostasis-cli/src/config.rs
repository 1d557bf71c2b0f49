//! Configuration loading for the Allostasis CLI.

use allostasis::prelude::*;
use allostasis::runtime::config::CONFIG_FILE_NAME;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Load the config at `explicit`, or the nearest `allostasis.toml`, or defaults.
///
/// Returns the path the config came from, if any.
pub fn load(explicit: Option<&Path>) -> Result<(SimulationConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => SimulationConfig::discover(&std::env::current_dir()?),
    };
    match path {
        Some(path) => {
            let config = SimulationConfig::load(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            Ok((config, Some(path)))
        }
        None => Ok((SimulationConfig::default(), None)),
    }
}

/// Save `config` as TOML.
pub fn save(config: &SimulationConfig, path: &Path) -> Result<()> {
    let content = config.to_toml_string().context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

/// Path of the config file inside `dir`.
pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE_NAME)
}

/// A food drop given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropSpec {
    pub x: i32,
    pub y: i32,
    pub amount: f64,
}

impl DropSpec {
    pub fn action(&self) -> ExternalAction {
        ExternalAction::DropFood {
            position: GridPos::new(self.x, self.y),
            amount: self.amount,
        }
    }
}

/// Parse `x,y` or `x,y,amount`. The amount defaults to 20.
pub fn parse_drop(s: &str) -> Result<DropSpec> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let (x, y, amount) = match parts.as_slice() {
        [x, y] => (x, y, "20"),
        [x, y, amount] => (x, y, *amount),
        _ => bail!("expected x,y or x,y,amount, got {:?}", s),
    };
    Ok(DropSpec {
        x: x.parse().with_context(|| format!("invalid x in {:?}", s))?,
        y: y.parse().with_context(|| format!("invalid y in {:?}", s))?,
        amount: amount
            .parse()
            .with_context(|| format!("invalid amount in {:?}", s))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_drop_with_and_without_amount() {
        assert_eq!(
            parse_drop("3,4").unwrap(),
            DropSpec { x: 3, y: 4, amount: 20.0 }
        );
        assert_eq!(
            parse_drop(" 1 , 2 , 7.5 ").unwrap(),
            DropSpec { x: 1, y: 2, amount: 7.5 }
        );
        assert!(parse_drop("1").is_err());
        assert!(parse_drop("a,2").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_path(dir.path());
        let mut config = SimulationConfig::default();
        config.population.count = 3;
        save(&config, &path).unwrap();

        let (loaded, from) = load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(from, Some(path));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
