//! Physiology — the two regulated variables and the physics that move them.
//!
//! The same [`PhysiologyParams`] drive the world (the runtime applies them
//! every tick) and each agent's internal generative model, so an agent's
//! prediction of "what happens if I stand here" uses the true dynamics.

use crate::error::ConfigError;
use crate::types::Tick;
use serde::{Deserialize, Serialize};

/// Why an agent died.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Energy fell to or below the survivable minimum.
    Starvation,
    /// Internal temperature fell below the survivable minimum.
    Hypothermia,
    /// Internal temperature rose above the survivable maximum.
    Hyperthermia,
}

/// Body dynamics shared by the world and the agents' internal model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysiologyParams {
    /// Energy burned every tick.
    pub metabolism: f64,
    /// Extra energy burned per unit of movement cost.
    pub move_cost: f64,
    /// Stomach capacity.
    pub max_energy: f64,
    /// Below this the agent counts as hungry.
    pub critical_energy: f64,
    /// Largest meal eaten in one `Consume`.
    pub food_intake: f64,
    /// Preferred internal temperature.
    pub preferred_temperature: f64,
    /// Thermal conductivity: fraction of the gap to ambient closed per tick.
    pub thermal_conductivity: f64,
    /// Ticks an agent keeps emitting food scent after a meal.
    pub food_signal_duration: f64,
    /// Meals smaller than this do not trigger a food signal.
    pub food_signal_threshold: f64,
}

impl Default for PhysiologyParams {
    fn default() -> Self {
        Self {
            metabolism: 0.15,
            move_cost: 0.0,
            max_energy: 100.0,
            critical_energy: 50.0,
            food_intake: 10.0,
            preferred_temperature: 25.0,
            thermal_conductivity: 0.1,
            food_signal_duration: 15.0,
            food_signal_threshold: 1.0,
        }
    }
}

impl PhysiologyParams {
    /// Internal temperature after one tick of exposure to `ambient`.
    pub fn relax_temperature(&self, internal: f64, ambient: f64) -> f64 {
        internal + self.thermal_conductivity * (ambient - internal)
    }

    /// Largest meal possible given what is on the cell and stomach space.
    pub fn meal_size(&self, energy: f64, food_available: f64) -> f64 {
        let space = (self.max_energy - energy).max(0.0);
        self.food_intake.min(food_available.max(0.0)).min(space)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.thermal_conductivity) {
            return Err(ConfigError::OutOfRange {
                field: "physiology.thermal_conductivity".into(),
                min: 0.0,
                max: 1.0,
                value: self.thermal_conductivity,
            });
        }
        if self.max_energy <= 0.0 {
            return Err(ConfigError::invalid(
                "physiology.max_energy",
                self.max_energy,
                "must be positive",
            ));
        }
        if self.metabolism < 0.0 || self.move_cost < 0.0 || self.food_intake < 0.0 {
            return Err(ConfigError::invalid(
                "physiology",
                self.metabolism.min(self.move_cost).min(self.food_intake),
                "metabolism, move_cost and food_intake must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Survivable range for both regulated variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivalBounds {
    pub min_energy: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl Default for SurvivalBounds {
    fn default() -> Self {
        Self {
            min_energy: 0.0,
            min_temperature: 0.0,
            max_temperature: 45.0,
        }
    }
}

impl SurvivalBounds {
    /// The first bound breached, if any. Energy is checked first.
    pub fn breach(&self, energy: f64, temperature: f64) -> Option<DeathCause> {
        if !energy.is_finite() || energy <= self.min_energy {
            Some(DeathCause::Starvation)
        } else if !temperature.is_finite() || temperature < self.min_temperature {
            Some(DeathCause::Hypothermia)
        } else if temperature > self.max_temperature {
            Some(DeathCause::Hyperthermia)
        } else {
            None
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_temperature >= self.max_temperature {
            return Err(ConfigError::invalid(
                "survival.min_temperature",
                self.min_temperature,
                "must be below survival.max_temperature",
            ));
        }
        Ok(())
    }
}

/// The live physiological state of one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Physiology {
    pub energy: f64,
    pub temperature: f64,
    pub alive: bool,
    /// Integrated mood: positive while deficits shrink.
    pub valence: f64,
    /// Inverse temperature of the policy softmax, modulated by valence.
    pub precision: f64,
    /// Remaining ticks of food-scent emission.
    pub food_signal: f64,
    pub died_at: Option<Tick>,
    pub death_cause: Option<DeathCause>,
}

impl Physiology {
    pub fn new(energy: f64, temperature: f64, precision: f64) -> Self {
        Self {
            energy,
            temperature,
            alive: true,
            valence: 0.0,
            precision,
            food_signal: 0.0,
            died_at: None,
            death_cause: None,
        }
    }

    pub fn is_hungry(&self, params: &PhysiologyParams) -> bool {
        self.energy < params.critical_energy
    }

    /// Weighted deficit from the set-points.
    pub fn deficit(&self, params: &PhysiologyParams, weight_temp: f64, weight_energy: f64) -> f64 {
        let err_t = (self.temperature - params.preferred_temperature).abs();
        let err_e = (params.critical_energy - self.energy).max(0.0);
        weight_temp * err_t + weight_energy * err_e
    }

    /// Mark the agent dead. Returns `false` if it was already dead, so a
    /// death is only ever recorded once.
    pub fn kill(&mut self, cause: DeathCause, tick: Tick) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.died_at = Some(tick);
        self.death_cause = Some(cause);
        self.precision = 0.0;
        self.energy = self.energy.max(0.0);
        true
    }
}
