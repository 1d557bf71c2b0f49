//! Shared types used across all Allostasis crates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic simulation step counter.
pub type Tick = u64;

/// Unique identifier for an agent in the world.
///
/// Ids are handed out by the simulation in increasing order and never
/// reused, so ordering by id is the deterministic processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

/// An integer cell coordinate. `(0, 0)` is the lower-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    ///
    /// The result may lie outside the grid; callers check bounds.
    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Chebyshev (king-move) distance.
    pub fn chebyshev(&self, other: &GridPos) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the eight Moore-neighbourhood directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Direction {
    /// Orthogonal directions first, then diagonals. This is also the
    /// candidate order used when breaking ties.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::NorthEast,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::NorthWest,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
            Direction::NorthEast => (1, 1),
            Direction::SouthEast => (1, -1),
            Direction::SouthWest => (-1, -1),
            Direction::NorthWest => (-1, 1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        let (dx, dy) = self.delta();
        dx != 0 && dy != 0
    }
}

/// An action an agent can take within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "direction", rename_all = "snake_case")]
pub enum Action {
    /// Do nothing. Always available.
    Stay,
    /// Eat from the food present at the current cell.
    Consume,
    /// Step to a neighbouring cell.
    Move(Direction),
}

impl Action {
    /// Cost used for tie-breaking: 0 in place, 1 orthogonal, 2 diagonal.
    pub fn movement_cost(&self) -> u32 {
        match self {
            Action::Stay | Action::Consume => 0,
            Action::Move(d) if d.is_diagonal() => 2,
            Action::Move(_) => 1,
        }
    }

    /// Cell the agent ends up in after taking this action from `from`.
    pub fn target(&self, from: GridPos) -> GridPos {
        match self {
            Action::Stay | Action::Consume => from,
            Action::Move(d) => from.step(*d),
        }
    }
}

/// A read-only copy of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellView {
    pub position: GridPos,
    pub food: f64,
    pub temperature: f64,
    /// Food scent left by agents that ate recently.
    pub scent: f64,
    /// Shared visit memory (stigmergic trail).
    pub trail: f64,
}

impl CellView {
    pub fn is_finite(&self) -> bool {
        self.food.is_finite()
            && self.temperature.is_finite()
            && self.scent.is_finite()
            && self.trail.is_finite()
    }
}

/// What an agent perceives of the environment around it: every in-bounds
/// cell within Chebyshev distance `radius` of `center`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalView {
    pub center: GridPos,
    pub radius: u32,
    pub cells: Vec<CellView>,
}

impl LocalView {
    pub fn cell_at(&self, position: GridPos) -> Option<&CellView> {
        self.cells.iter().find(|c| c.position == position)
    }

    pub fn center_cell(&self) -> Option<&CellView> {
        self.cell_at(self.center)
    }
}

/// A mutation requested from outside the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExternalAction {
    /// Add `amount` food to the cell at `position`.
    DropFood { position: GridPos, amount: f64 },
}

impl ExternalAction {
    pub fn kind(&self) -> &'static str {
        match self {
            ExternalAction::DropFood { .. } => "drop_food",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_moves_cost_more() {
        assert_eq!(Action::Stay.movement_cost(), 0);
        assert_eq!(Action::Consume.movement_cost(), 0);
        assert_eq!(Action::Move(Direction::West).movement_cost(), 1);
        assert_eq!(Action::Move(Direction::SouthEast).movement_cost(), 2);
    }

    #[test]
    fn step_follows_delta() {
        let p = GridPos::new(3, 3);
        assert_eq!(p.step(Direction::North), GridPos::new(3, 4));
        assert_eq!(p.step(Direction::SouthWest), GridPos::new(2, 2));
        assert_eq!(Action::Move(Direction::East).target(p), GridPos::new(4, 3));
        assert_eq!(Action::Consume.target(p), p);
    }

    #[test]
    fn chebyshev_counts_diagonals_as_one() {
        let a = GridPos::new(0, 0);
        assert_eq!(a.chebyshev(&GridPos::new(1, 1)), 1);
        assert_eq!(a.chebyshev(&GridPos::new(-3, 2)), 3);
    }

    #[test]
    fn external_action_uses_kind_tag() {
        let action = ExternalAction::DropFood {
            position: GridPos::new(2, 5),
            amount: 12.5,
        };
        let json = serde_json::to_value(action).unwrap();
        assert_eq!(json["kind"], "drop_food");
        assert_eq!(json["position"]["x"], 2);
        assert_eq!(action.kind(), "drop_food");
    }
}
