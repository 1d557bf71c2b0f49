//! Environment — the shared spatial field all agents live in.
//!
//! Holds food and ambient temperature per cell, plus two decaying signal
//! fields (food scent and visit trail) agents use as cues.

use crate::types::*;

/// The spatial world agents observe and modify.
pub trait Environment {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn in_bounds(&self, position: GridPos) -> bool {
        position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width()
            && (position.y as u32) < self.height()
    }

    /// Every in-bounds cell within Chebyshev distance `radius`. No side effects.
    fn observe(&self, position: GridPos, radius: u32) -> LocalView;

    /// Remove up to `amount` food. Returns what was actually removed, which
    /// may be less than requested (or zero off-grid). Never fails.
    fn consume(&mut self, position: GridPos, amount: f64) -> f64;

    /// Add food at a cell, clamped to the cell capacity if one is set.
    /// Returns the amount actually added.
    fn apply_drop(&mut self, position: GridPos, amount: f64) -> f64;

    /// Per-tick decay of the signal fields. Called once per tick.
    fn advance(&mut self);

    fn food_at(&self, position: GridPos) -> Option<f64>;

    fn temperature_at(&self, position: GridPos) -> Option<f64>;

    /// Mark a visit in the shared trail field.
    fn deposit_trail(&mut self, position: GridPos, amount: f64);

    /// Add food scent at a cell.
    fn emit_scent(&mut self, position: GridPos, intensity: f64);
}
