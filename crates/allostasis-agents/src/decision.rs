//! Decision engine — active-inference policy selection.
//!
//! For every action available to the agent, a one-step generative model
//! predicts the next internal temperature and energy. Each prediction is
//! scored by its expected free energy, where lower deficit from the
//! set-points is better:
//!
//! - **pragmatic**: `-(w_temp * |T' - T_pref| + w_energy * max(0, E_crit - E'))`
//! - **epistemic**: `w_epi / (1 + exploration * trail)`, a pull toward cells
//!   nobody visited lately
//! - **social**: while hungry, `social_weight * scent`, a pull toward cells
//!   where others recently ate
//!
//! The engine is pure: the same physiology, view and seed always give the
//! same decision.

use allostasis_core::error::{AgentFault, ConfigError};
use allostasis_core::physiology::{Physiology, PhysiologyParams};
use allostasis_core::types::*;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Scores within this distance are treated as equal.
const TIE_EPSILON: f64 = 1e-9;

/// How the engine turns scores into a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyMode {
    /// Best score wins; ties go to the cheapest movement.
    #[default]
    Greedy,
    /// Sample from `softmax(precision * G)` using the decision seed.
    Softmax,
}

/// Preference weights of the agent's internal model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionParams {
    pub policy: PolicyMode,
    /// Importance of thermal comfort.
    pub weight_temperature: f64,
    /// Importance of staying above critical energy.
    pub weight_energy: f64,
    /// Importance of curiosity.
    pub weight_epistemic: f64,
    /// How strongly a visited cell loses novelty.
    pub exploration: f64,
    /// Attraction to food scent while hungry.
    pub social_weight: f64,
    /// Discount on a meal expected one step after arriving at a cell.
    pub anticipation: f64,
    /// Cells with less food than this count as empty.
    pub min_food: f64,
}

impl Default for DecisionParams {
    fn default() -> Self {
        Self {
            policy: PolicyMode::Greedy,
            weight_temperature: 1.0,
            weight_energy: 4.0,
            weight_epistemic: 1.5,
            exploration: 10.0,
            social_weight: 3.0,
            anticipation: 0.9,
            min_food: 0.1,
        }
    }
}

impl DecisionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("decision.weight_temperature", self.weight_temperature),
            ("decision.weight_energy", self.weight_energy),
            ("decision.weight_epistemic", self.weight_epistemic),
            ("decision.exploration", self.exploration),
            ("decision.social_weight", self.social_weight),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, value, "must be a non-negative number"));
            }
        }
        if !(0.0..=1.0).contains(&self.anticipation) {
            return Err(ConfigError::OutOfRange {
                field: "decision.anticipation".into(),
                min: 0.0,
                max: 1.0,
                value: self.anticipation,
            });
        }
        Ok(())
    }
}

/// The model's prediction and score for one candidate action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub action: Action,
    pub target: GridPos,
    pub predicted_energy: f64,
    pub predicted_temperature: f64,
    pub pragmatic: f64,
    pub epistemic: f64,
    pub social: f64,
}

impl CandidateScore {
    /// Negative expected free energy. Higher is better.
    pub fn total(&self) -> f64 {
        self.pragmatic + self.epistemic + self.social
    }

    /// Weighted physiological deficit predicted for this action.
    pub fn expected_deficit(&self) -> f64 {
        -self.pragmatic
    }
}

/// The outcome of one decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    pub score: CandidateScore,
    /// How many actions were available.
    pub candidates: usize,
}

/// Active-inference policy shared by every agent of a population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionEngine {
    physiology: PhysiologyParams,
    params: DecisionParams,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(PhysiologyParams::default(), DecisionParams::default())
    }
}

impl DecisionEngine {
    pub fn new(physiology: PhysiologyParams, params: DecisionParams) -> Self {
        Self { physiology, params }
    }

    pub fn params(&self) -> &DecisionParams {
        &self.params
    }

    pub fn physiology(&self) -> &PhysiologyParams {
        &self.physiology
    }

    /// Score every action available from the view's centre.
    ///
    /// `Stay` is always first. `Consume` follows when the current cell has
    /// food, then one `Move` per in-view neighbour in [`Direction::ALL`] order.
    pub fn evaluate(
        &self,
        state: &Physiology,
        view: &LocalView,
    ) -> Result<Vec<CandidateScore>, AgentFault> {
        let here = validate_view(view)?;
        if !state.energy.is_finite() || !state.temperature.is_finite() {
            return Err(AgentFault::malformed("physiology is not finite"));
        }

        let hungry = state.is_hungry(&self.physiology);
        let mut candidates = Vec::with_capacity(Direction::ALL.len() + 2);

        candidates.push(self.score(Action::Stay, here, state, hungry));
        if here.food > self.params.min_food {
            candidates.push(self.score(Action::Consume, here, state, hungry));
        }
        for direction in Direction::ALL {
            let target = view.center.step(direction);
            if let Some(cell) = view.cell_at(target) {
                candidates.push(self.score(Action::Move(direction), cell, state, hungry));
            }
        }

        Ok(candidates)
    }

    /// Pick an action. `seed` only matters for [`PolicyMode::Softmax`].
    pub fn decide(
        &self,
        state: &Physiology,
        view: &LocalView,
        seed: u64,
    ) -> Result<Decision, AgentFault> {
        let candidates = self.evaluate(state, view)?;
        let idx = match self.params.policy {
            PolicyMode::Greedy => select_greedy(&candidates),
            PolicyMode::Softmax => select_softmax(&candidates, state.precision, seed),
        };
        let score = candidates[idx];
        Ok(Decision {
            action: score.action,
            score,
            candidates: candidates.len(),
        })
    }

    fn score(&self, action: Action, cell: &CellView, state: &Physiology, hungry: bool) -> CandidateScore {
        let p = &self.physiology;
        let d = &self.params;

        let predicted_temperature = p.relax_temperature(state.temperature, cell.temperature);

        let burn = p.metabolism + p.move_cost * action.movement_cost() as f64;
        let intake = match action {
            Action::Consume => p.meal_size(state.energy, cell.food),
            Action::Move(_) if cell.food > d.min_food => {
                d.anticipation * p.meal_size(state.energy - burn, cell.food)
            }
            _ => 0.0,
        };
        let predicted_energy = (state.energy - burn + intake).min(p.max_energy);

        let err_t = (predicted_temperature - p.preferred_temperature).abs();
        let err_e = (p.critical_energy - predicted_energy).max(0.0);
        let pragmatic = -(d.weight_temperature * err_t + d.weight_energy * err_e);

        let epistemic = d.weight_epistemic / (1.0 + d.exploration * cell.trail.max(0.0));

        let social = if hungry {
            d.social_weight * cell.scent.max(0.0)
        } else {
            0.0
        };

        CandidateScore {
            action,
            target: cell.position,
            predicted_energy,
            predicted_temperature,
            pragmatic,
            epistemic,
            social,
        }
    }
}

fn validate_view(view: &LocalView) -> Result<&CellView, AgentFault> {
    let here = view
        .center_cell()
        .ok_or_else(|| AgentFault::malformed(format!("no cell at centre {}", view.center)))?;
    for cell in &view.cells {
        if !cell.is_finite() {
            return Err(AgentFault::malformed(format!(
                "non-finite values at {}",
                cell.position
            )));
        }
        if cell.position.chebyshev(&view.center) > view.radius {
            return Err(AgentFault::malformed(format!(
                "cell {} lies outside radius {}",
                cell.position, view.radius
            )));
        }
    }
    Ok(here)
}

fn select_greedy(candidates: &[CandidateScore]) -> usize {
    let mut best = 0;
    for (idx, c) in candidates.iter().enumerate().skip(1) {
        let incumbent = &candidates[best];
        let diff = c.total() - incumbent.total();
        let cheaper = c.action.movement_cost() < incumbent.action.movement_cost();
        if diff > TIE_EPSILON || (diff.abs() <= TIE_EPSILON && cheaper) {
            best = idx;
        }
    }
    best
}

fn select_softmax(candidates: &[CandidateScore], precision: f64, seed: u64) -> usize {
    let max = candidates
        .iter()
        .map(CandidateScore::total)
        .fold(f64::NEG_INFINITY, f64::max);
    let beta = if precision.is_finite() { precision.max(0.0) } else { 0.0 };
    let weights: Vec<f64> = candidates
        .iter()
        .map(|c| (beta * (c.total() - max)).exp())
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    match WeightedIndex::new(&weights) {
        Ok(dist) => dist.sample(&mut rng),
        Err(_) => select_greedy(candidates),
    }
}
