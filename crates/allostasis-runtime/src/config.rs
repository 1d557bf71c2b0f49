//! Simulation configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config.

use crate::error::{Result, SimulationError};
use crate::grid::FieldDecay;
use allostasis_agents::affect::AffectParams;
use allostasis_agents::decision::DecisionParams;
use allostasis_agents::spawn::PopulationSpec;
use allostasis_core::error::ConfigError;
use allostasis_core::physiology::{PhysiologyParams, SurvivalBounds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name searched for by [`SimulationConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "allostasis.toml";

/// Everything needed to build and run a world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub population: PopulationSpec,
    #[serde(default)]
    pub physiology: PhysiologyParams,
    #[serde(default)]
    pub survival: SurvivalBounds,
    #[serde(default)]
    pub decision: DecisionParams,
    #[serde(default)]
    pub affect: AffectParams,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Grid dimensions, field generation and signal dynamics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Seeds field generation, population placement and every decision.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_food_patches")]
    pub food_patches: usize,
    #[serde(default = "default_food_patch_min")]
    pub food_patch_min: f64,
    #[serde(default = "default_food_patch_max")]
    pub food_patch_max: f64,
    /// Peak ambient temperature of the central plateau.
    #[serde(default = "default_temperature_plateau")]
    pub temperature_plateau: f64,
    #[serde(default = "default_temperature_spot_1")]
    pub temperature_spot_1: f64,
    #[serde(default = "default_temperature_spot_2")]
    pub temperature_spot_2: f64,
    /// Chebyshev radius of the neighbourhood each agent observes.
    #[serde(default = "default_observation_radius")]
    pub observation_radius: u32,
    /// Trail left on a cell by each visit.
    #[serde(default = "default_trail_deposit")]
    pub trail_deposit: f64,
    /// Scent emitted right after a meal; fades with the food signal.
    #[serde(default = "default_scent_strength")]
    pub scent_strength: f64,
    /// Upper bound on food per cell. Unbounded when absent.
    #[serde(default)]
    pub cell_capacity: Option<f64>,
    #[serde(default)]
    pub decay: FieldDecay,
}

/// Tick cadence and lifecycle policy of the background scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Stop automatically after this many ticks.
    #[serde(default)]
    pub max_ticks: Option<u64>,
    /// Remove dead agents this many ticks after death.
    #[serde(default)]
    pub reap_dead_after: Option<u64>,
}

fn default_width() -> u32 {
    40
}

fn default_height() -> u32 {
    40
}

fn default_seed() -> u64 {
    42
}

fn default_food_patches() -> usize {
    1
}

fn default_food_patch_min() -> f64 {
    30.0
}

fn default_food_patch_max() -> f64 {
    80.0
}

fn default_temperature_plateau() -> f64 {
    28.0
}

fn default_temperature_spot_1() -> f64 {
    14.0
}

fn default_temperature_spot_2() -> f64 {
    12.0
}

fn default_observation_radius() -> u32 {
    1
}

fn default_trail_deposit() -> f64 {
    1.0
}

fn default_scent_strength() -> f64 {
    2.0
}

fn default_tick_interval_ms() -> u64 {
    100
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            seed: default_seed(),
            food_patches: default_food_patches(),
            food_patch_min: default_food_patch_min(),
            food_patch_max: default_food_patch_max(),
            temperature_plateau: default_temperature_plateau(),
            temperature_spot_1: default_temperature_spot_1(),
            temperature_spot_2: default_temperature_spot_2(),
            observation_radius: default_observation_radius(),
            trail_deposit: default_trail_deposit(),
            scent_strength: default_scent_strength(),
            cell_capacity: None,
            decay: FieldDecay::default(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            max_ticks: None,
            reap_dead_after: None,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::invalid(
                "world",
                format!("{}x{}", self.width, self.height),
                "grid must have at least one cell",
            ));
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(ConfigError::invalid(
                "world",
                format!("{}x{}", self.width, self.height),
                "grid too large",
            ));
        }
        let longest = self.width.max(self.height);
        if self.observation_radius > longest {
            return Err(ConfigError::invalid(
                "world.observation_radius",
                self.observation_radius,
                format!("must not exceed the grid's longest side ({})", longest),
            ));
        }
        if self.food_patch_min > self.food_patch_max || self.food_patch_min < 0.0 {
            return Err(ConfigError::invalid(
                "world.food_patch_min",
                self.food_patch_min,
                "must be non-negative and not exceed world.food_patch_max",
            ));
        }
        for (field, value) in [
            ("world.decay.scent", self.decay.scent),
            ("world.decay.trail", self.decay.trail),
            ("world.decay.food", self.decay.food),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field: field.into(),
                    min: 0.0,
                    max: 1.0,
                    value,
                });
            }
        }
        if let Some(capacity) = self.cell_capacity {
            if !capacity.is_finite() || capacity <= 0.0 {
                return Err(ConfigError::invalid(
                    "world.cell_capacity",
                    capacity,
                    "must be a positive number",
                ));
            }
        }
        Ok(())
    }
}

impl SimulationConfig {
    /// Reject values the world cannot run with.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.world.validate()?;
        self.population.validate()?;
        self.physiology.validate()?;
        self.survival.validate()?;
        self.decision.validate()?;
        self.affect.validate()?;
        if self.population.initial_energy_max > self.physiology.max_energy {
            return Err(ConfigError::invalid(
                "population.initial_energy_max",
                self.population.initial_energy_max,
                "must not exceed physiology.max_energy",
            ));
        }
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Find `allostasis.toml` in `start` or any of its parents.
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| SimulationError::Corrupted(format!("config not serializable: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Simulation;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.world.width, 40);
        assert_eq!(config.world.observation_radius, 1);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [world]
            width = 12
            seed = 7

            [decision]
            policy = "softmax"

            [scheduler]
            max_ticks = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.world.width, 12);
        assert_eq!(config.world.height, 40);
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.scheduler.max_ticks, Some(500));
        assert_eq!(config.scheduler.tick_interval_ms, 100);
        assert_eq!(config.physiology.metabolism, 0.15);
    }

    #[test]
    fn zero_width_rejected() {
        let err = SimulationConfig::from_toml_str("[world]\nwidth = 0\n").unwrap_err();
        assert!(matches!(err, SimulationError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn observation_radius_bounded_by_grid() {
        let mut config = SimulationConfig::default();
        config.world.observation_radius = 40_000;
        assert!(config.validate().is_err());
        assert!(Simulation::from_config(&config).is_err());

        config.world.observation_radius = 40;
        assert!(config.validate().is_ok());
        let mut sim = Simulation::from_config(&config).unwrap();
        assert_eq!(sim.step_once().unwrap().tick, 1);
    }

    #[test]
    fn bad_toml_is_parse_error() {
        let err = SimulationConfig::from_toml_str("[world\nwidth = ").unwrap_err();
        assert!(matches!(err, SimulationError::Parse(_)));
    }

    #[test]
    fn written_config_loads_back() {
        let mut config = SimulationConfig::default();
        config.world.seed = 99;
        config.world.cell_capacity = Some(150.0);
        let text = config.to_toml_string().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        let loaded = SimulationConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn discovers_config_in_parent() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(SimulationConfig::discover(&nested), None);

        let path = root.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[world]\nseed = 1\n").unwrap();
        assert_eq!(SimulationConfig::discover(&nested), Some(path));
    }
}
