//! Grid — the concrete [`Environment`].
//!
//! Four row-major fields of `width * height` cells. Food and ambient
//! temperature are the world proper; scent and trail are decaying signal
//! fields written by agents and read by their decision model.

use crate::config::WorldConfig;
use crate::error::SimulationError;
use allostasis_core::environment::Environment;
use allostasis_core::types::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-tick decay of the grid's fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDecay {
    /// Multiplier applied to scent each tick.
    pub scent: f64,
    /// Multiplier applied to trail each tick.
    pub trail: f64,
    /// Signal values below this are zeroed.
    pub floor: f64,
    /// Fraction of food lost each tick.
    pub food: f64,
}

impl Default for FieldDecay {
    fn default() -> Self {
        Self {
            scent: 0.94,
            trail: 0.90,
            floor: 0.05,
            food: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    food: Vec<f64>,
    temperature: Vec<f64>,
    scent: Vec<f64>,
    trail: Vec<f64>,
    decay: FieldDecay,
    cell_capacity: Option<f64>,
}

impl Grid {
    /// An empty grid at a uniform ambient temperature.
    pub fn uniform(width: u32, height: u32, temperature: f64) -> Self {
        let cells = width as usize * height as usize;
        Self {
            width,
            height,
            food: vec![0.0; cells],
            temperature: vec![temperature; cells],
            scent: vec![0.0; cells],
            trail: vec![0.0; cells],
            decay: FieldDecay::default(),
            cell_capacity: None,
        }
    }

    /// Build the world described by `config`, drawing food patches from `rng`.
    ///
    /// Ambient temperature is a warm central plateau plus two hot spots;
    /// food sits in Gaussian patches at random centres.
    pub fn generate<R: Rng>(config: &WorldConfig, rng: &mut R) -> Self {
        let mut grid = Self::uniform(config.width, config.height, 0.0);
        grid.decay = config.decay;
        grid.cell_capacity = config.cell_capacity;

        let w = config.width as f64;
        let h = config.height as f64;
        for y in 0..config.height {
            for x in 0..config.width {
                let (fx, fy) = (x as f64, y as f64);
                let plateau = config.temperature_plateau
                    * (-((fx - w / 2.0).powi(2) + (fy - h / 2.0).powi(2)) / (w * 7.5)).exp();
                let spot_1 = config.temperature_spot_1
                    * (-((fx - w * 0.2).powi(2) + (fy - h * 0.8).powi(2)) / 70.0).exp();
                let spot_2 = config.temperature_spot_2
                    * (-((fx - w * 0.75).powi(2) + (fy - h * 0.25).powi(2)) / 60.0).exp();
                let idx = grid.index_unchecked(x, y);
                grid.temperature[idx] = plateau + spot_1 + spot_2;
            }
        }

        for _ in 0..config.food_patches {
            let cx = patch_centre(rng, config.width);
            let cy = patch_centre(rng, config.height);
            let amplitude = if config.food_patch_min < config.food_patch_max {
                rng.gen_range(config.food_patch_min..config.food_patch_max)
            } else {
                config.food_patch_min
            };
            let sigma: f64 = rng.gen_range(2.0..4.0);
            for y in 0..config.height {
                for x in 0..config.width {
                    let d = (x as f64 - cx).powi(2) + (y as f64 - cy).powi(2);
                    if d < 30.0 {
                        let idx = grid.index_unchecked(x, y);
                        grid.food[idx] += amplitude * (-d / (2.0 * sigma * sigma)).exp();
                    }
                }
            }
        }

        if let Some(capacity) = grid.cell_capacity {
            for f in grid.food.iter_mut() {
                *f = f.min(capacity);
            }
        }
        grid
    }

    pub fn with_decay(mut self, decay: FieldDecay) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_capacity(mut self, capacity: Option<f64>) -> Self {
        self.cell_capacity = capacity;
        self
    }

    pub fn cell_capacity(&self) -> Option<f64> {
        self.cell_capacity
    }

    fn index_unchecked(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Row-major index of an in-bounds cell.
    pub fn index(&self, position: GridPos) -> Option<usize> {
        if self.in_bounds(position) {
            Some(self.index_unchecked(position.x as u32, position.y as u32))
        } else {
            None
        }
    }

    pub fn position_of(&self, index: usize) -> GridPos {
        let w = self.width.max(1) as usize;
        GridPos::new((index % w) as i32, (index / w) as i32)
    }

    /// Overwrite the food at a cell. Returns `false` off-grid.
    pub fn set_food(&mut self, position: GridPos, amount: f64) -> bool {
        match self.index(position) {
            Some(idx) => {
                self.food[idx] = amount;
                true
            }
            None => false,
        }
    }

    /// Overwrite the ambient temperature at a cell. Returns `false` off-grid.
    pub fn set_temperature(&mut self, position: GridPos, temperature: f64) -> bool {
        match self.index(position) {
            Some(idx) => {
                self.temperature[idx] = temperature;
                true
            }
            None => false,
        }
    }

    pub fn scent_at(&self, position: GridPos) -> Option<f64> {
        self.index(position).map(|i| self.scent[i])
    }

    pub fn trail_at(&self, position: GridPos) -> Option<f64> {
        self.index(position).map(|i| self.trail[i])
    }

    pub fn food(&self) -> &[f64] {
        &self.food
    }

    pub fn temperature(&self) -> &[f64] {
        &self.temperature
    }

    pub fn scent(&self) -> &[f64] {
        &self.scent
    }

    pub fn trail(&self) -> &[f64] {
        &self.trail
    }

    pub fn total_food(&self) -> f64 {
        self.food.iter().sum()
    }

    /// Integrity check run before every tick.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let cells = self.width as usize * self.height as usize;
        let fields = [
            ("food", &self.food),
            ("temperature", &self.temperature),
            ("scent", &self.scent),
            ("trail", &self.trail),
        ];
        for (name, field) in fields {
            if field.len() != cells {
                return Err(SimulationError::Corrupted(format!(
                    "{} field has {} cells, expected {}x{} = {}",
                    name,
                    field.len(),
                    self.width,
                    self.height,
                    cells
                )));
            }
            if let Some(i) = field.iter().position(|v| !v.is_finite()) {
                return Err(SimulationError::Corrupted(format!(
                    "{} at {} is not finite",
                    name,
                    self.position_of(i)
                )));
            }
        }
        if let Some(i) = self.food.iter().position(|v| *v < 0.0) {
            return Err(SimulationError::Corrupted(format!(
                "negative food {} at {}",
                self.food[i],
                self.position_of(i)
            )));
        }
        Ok(())
    }

    /// Scent cells above `threshold` as `(x, y, value)`.
    pub fn heatmap(&self, threshold: f64) -> Vec<(i32, i32, f64)> {
        heatmap_cells(&self.scent, self.width, threshold)
    }

    fn cell_view(&self, position: GridPos, idx: usize) -> CellView {
        CellView {
            position,
            food: self.food[idx],
            temperature: self.temperature[idx],
            scent: self.scent[idx],
            trail: self.trail[idx],
        }
    }
}

/// Cells of a row-major `field` above `threshold` as `(x, y, value)`.
pub(crate) fn heatmap_cells(field: &[f64], width: u32, threshold: f64) -> Vec<(i32, i32, f64)> {
    let w = width.max(1) as usize;
    field
        .iter()
        .enumerate()
        .filter(|(_, v)| **v > threshold)
        .map(|(i, v)| ((i % w) as i32, (i / w) as i32, *v))
        .collect()
}

fn patch_centre<R: Rng>(rng: &mut R, extent: u32) -> f64 {
    if extent > 10 {
        rng.gen_range(5..extent - 5) as f64
    } else {
        rng.gen_range(0..extent.max(1)) as f64
    }
}

fn decay_field(field: &mut [f64], factor: f64, floor: f64) {
    for v in field.iter_mut() {
        *v *= factor;
        if *v < floor {
            *v = 0.0;
        }
    }
}

impl Environment for Grid {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn observe(&self, position: GridPos, radius: u32) -> LocalView {
        // A radius past the grid's longest side sees the same cells.
        let r = i64::from(radius.min(self.width.max(self.height)));
        let clip = |center: i32, len: u32| {
            let lo = (i64::from(center) - r).max(0);
            let hi = (i64::from(center) + r).min(i64::from(len) - 1);
            lo..=hi
        };
        let xs = clip(position.x, self.width);
        let ys = clip(position.y, self.height);
        let side = |range: &std::ops::RangeInclusive<i64>| {
            usize::try_from(range.end() - range.start() + 1).unwrap_or(0)
        };
        let mut cells = Vec::with_capacity(side(&xs).saturating_mul(side(&ys)));
        for y in ys {
            for x in xs.clone() {
                let p = GridPos::new(x as i32, y as i32);
                if let Some(idx) = self.index(p) {
                    cells.push(self.cell_view(p, idx));
                }
            }
        }
        LocalView {
            center: position,
            radius,
            cells,
        }
    }

    fn consume(&mut self, position: GridPos, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        match self.index(position) {
            Some(idx) => {
                let removed = amount.min(self.food[idx].max(0.0));
                self.food[idx] -= removed;
                removed
            }
            None => 0.0,
        }
    }

    fn apply_drop(&mut self, position: GridPos, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        let capacity = self.cell_capacity;
        match self.index(position) {
            Some(idx) => {
                let added = match capacity {
                    Some(cap) => amount.min((cap - self.food[idx]).max(0.0)),
                    None => amount,
                };
                self.food[idx] += added;
                added
            }
            None => 0.0,
        }
    }

    fn advance(&mut self) {
        let decay = self.decay;
        decay_field(&mut self.scent, decay.scent, decay.floor);
        decay_field(&mut self.trail, decay.trail, decay.floor);
        if decay.food > 0.0 {
            let keep = 1.0 - decay.food;
            for f in self.food.iter_mut() {
                *f *= keep;
            }
        }
    }

    fn food_at(&self, position: GridPos) -> Option<f64> {
        self.index(position).map(|i| self.food[i])
    }

    fn temperature_at(&self, position: GridPos) -> Option<f64> {
        self.index(position).map(|i| self.temperature[i])
    }

    fn deposit_trail(&mut self, position: GridPos, amount: f64) {
        if let Some(idx) = self.index(position) {
            self.trail[idx] += amount;
        }
    }

    fn emit_scent(&mut self, position: GridPos, intensity: f64) {
        if let Some(idx) = self.index(position) {
            self.scent[idx] += intensity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn observe_clips_at_corner() {
        let grid = Grid::uniform(5, 5, 20.0);
        let view = grid.observe(GridPos::new(0, 0), 1);
        assert_eq!(view.cells.len(), 4, "corner sees itself and three neighbours");
        assert!(view.center_cell().is_some());

        let view = grid.observe(GridPos::new(2, 2), 1);
        assert_eq!(view.cells.len(), 9);
    }

    #[test]
    fn observe_with_huge_radius_sees_whole_grid() {
        let grid = Grid::uniform(4, 3, 20.0);
        let view = grid.observe(GridPos::new(1, 2), u32::MAX);
        assert_eq!(view.cells.len(), 12);
        assert_eq!(view.cells[0].position, GridPos::new(0, 0));
        assert_eq!(view.cells[11].position, GridPos::new(3, 2));
        assert_eq!(view.radius, u32::MAX);
    }

    #[test]
    fn consume_never_overdraws() {
        let mut grid = Grid::uniform(3, 3, 20.0);
        let p = GridPos::new(1, 1);
        grid.set_food(p, 4.0);
        assert_eq!(grid.consume(p, 10.0), 4.0);
        assert_eq!(grid.food_at(p), Some(0.0));
        assert_eq!(grid.consume(p, 10.0), 0.0);
        assert_eq!(grid.consume(GridPos::new(9, 9), 10.0), 0.0);
        assert_eq!(grid.consume(p, -1.0), 0.0);
    }

    #[test]
    fn drop_respects_capacity() {
        let mut grid = Grid::uniform(3, 3, 20.0).with_capacity(Some(25.0));
        let p = GridPos::new(2, 0);
        assert_eq!(grid.apply_drop(p, 20.0), 20.0);
        assert_eq!(grid.apply_drop(p, 20.0), 5.0);
        assert_eq!(grid.food_at(p), Some(25.0));
        assert_eq!(grid.apply_drop(GridPos::new(-1, 0), 5.0), 0.0);
    }

    #[test]
    fn signals_decay_to_zero() {
        let mut grid = Grid::uniform(2, 2, 20.0);
        let p = GridPos::new(0, 1);
        grid.emit_scent(p, 1.0);
        grid.deposit_trail(p, 1.0);
        grid.advance();
        assert!((grid.scent_at(p).unwrap() - 0.94).abs() < 1e-12);
        assert!((grid.trail_at(p).unwrap() - 0.90).abs() < 1e-12);
        for _ in 0..100 {
            grid.advance();
        }
        assert_eq!(grid.scent_at(p), Some(0.0));
        assert_eq!(grid.trail_at(p), Some(0.0));
    }

    #[test]
    fn generated_world_is_valid_and_seeded() {
        let config = WorldConfig::default();
        let a = Grid::generate(&config, &mut ChaCha8Rng::seed_from_u64(5));
        let b = Grid::generate(&config, &mut ChaCha8Rng::seed_from_u64(5));
        a.validate().unwrap();
        assert_eq!(a.food(), b.food());
        assert!(a.total_food() > 0.0, "at least one food patch expected");

        let centre = a.temperature_at(GridPos::new(20, 20)).unwrap();
        let corner = a.temperature_at(GridPos::new(0, 0)).unwrap();
        assert!(centre > corner, "centre {} should be warmer than corner {}", centre, corner);
    }

    #[test]
    fn validate_catches_nan() {
        let mut grid = Grid::uniform(3, 3, 20.0);
        grid.set_food(GridPos::new(1, 2), f64::NAN);
        assert!(matches!(grid.validate(), Err(SimulationError::Corrupted(_))));
    }

    #[test]
    fn heatmap_lists_strong_scent() {
        let mut grid = Grid::uniform(4, 4, 20.0);
        grid.emit_scent(GridPos::new(3, 1), 0.5);
        grid.emit_scent(GridPos::new(0, 0), 0.05);
        assert_eq!(grid.heatmap(0.1), vec![(3, 1, 0.5)]);
    }
}
