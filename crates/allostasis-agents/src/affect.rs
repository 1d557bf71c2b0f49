//! Affect — valence and precision.
//!
//! Valence is the smoothed rate at which the agent's weighted deficit is
//! shrinking. It modulates precision, the confidence of the policy:
//! things going well make the agent more decisive, things going badly make
//! it explore.

use allostasis_core::error::ConfigError;
use allostasis_core::physiology::Physiology;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffectParams {
    /// Fraction of the instantaneous valence folded into mood each tick.
    pub integration_rate: f64,
    /// How strongly mood scales precision.
    pub sensitivity: f64,
    pub base_precision: f64,
    pub min_precision: f64,
    pub max_precision: f64,
}

impl Default for AffectParams {
    fn default() -> Self {
        Self {
            integration_rate: 0.4,
            sensitivity: 0.8,
            base_precision: 6.0,
            min_precision: 0.5,
            max_precision: 30.0,
        }
    }
}

impl AffectParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.integration_rate) {
            return Err(ConfigError::OutOfRange {
                field: "affect.integration_rate".into(),
                min: 0.0,
                max: 1.0,
                value: self.integration_rate,
            });
        }
        if self.min_precision > self.max_precision || self.min_precision < 0.0 {
            return Err(ConfigError::invalid(
                "affect.min_precision",
                self.min_precision,
                "must be non-negative and not above affect.max_precision",
            ));
        }
        Ok(())
    }

    pub fn precision_for(&self, valence: f64) -> f64 {
        (self.base_precision * (self.sensitivity * valence).exp())
            .clamp(self.min_precision, self.max_precision)
    }
}

/// Per-agent memory needed to compute valence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Affect {
    previous_deficit: Option<f64>,
}

impl Affect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold this tick's deficit into mood and update precision.
    pub fn integrate(&mut self, state: &mut Physiology, deficit: f64, params: &AffectParams) {
        let previous = *self.previous_deficit.get_or_insert(deficit);
        let instantaneous = previous - deficit;
        self.previous_deficit = Some(deficit);

        state.valence += params.integration_rate * (instantaneous - state.valence);
        state.precision = params.precision_for(state.valence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_neutral() {
        let params = AffectParams::default();
        let mut state = Physiology::new(60.0, 20.0, params.base_precision);
        let mut affect = Affect::new();
        affect.integrate(&mut state, 12.0, &params);
        assert_eq!(state.valence, 0.0);
        assert_eq!(state.precision, params.base_precision);
    }

    #[test]
    fn shrinking_deficit_raises_mood_and_precision() {
        let params = AffectParams::default();
        let mut state = Physiology::new(60.0, 20.0, params.base_precision);
        let mut affect = Affect::new();
        affect.integrate(&mut state, 12.0, &params);
        affect.integrate(&mut state, 10.0, &params);
        assert!((state.valence - 0.8).abs() < 1e-9, "valence was {}", state.valence);
        assert!(state.precision > params.base_precision);
    }

    #[test]
    fn growing_deficit_lowers_precision_to_floor() {
        let params = AffectParams::default();
        let mut state = Physiology::new(60.0, 20.0, params.base_precision);
        let mut affect = Affect::new();
        let mut deficit = 0.0;
        for _ in 0..50 {
            affect.integrate(&mut state, deficit, &params);
            deficit += 5.0;
        }
        assert!(state.valence < 0.0);
        assert_eq!(state.precision, params.min_precision);
    }
}
