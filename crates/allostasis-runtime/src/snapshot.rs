//! Snapshots — immutable copies of the world published once per tick.

use crate::grid::heatmap_cells;
use crate::sync::SchedulerStatus;
use allostasis_core::physiology::DeathCause;
use allostasis_core::types::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One agent as it was at the end of a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub agent_type: String,
    pub position: GridPos,
    pub energy: f64,
    pub temperature: f64,
    pub valence: f64,
    pub precision: f64,
    pub alive: bool,
    pub age: Tick,
    pub food_signal: f64,
    pub died_at: Option<Tick>,
    pub death_cause: Option<DeathCause>,
}

/// The grid's fields, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: u32,
    pub height: u32,
    pub food: Vec<f64>,
    pub temperature: Vec<f64>,
    pub scent: Vec<f64>,
    pub trail: Vec<f64>,
}

impl GridSnapshot {
    fn index(&self, position: GridPos) -> Option<usize> {
        let in_bounds = position.x >= 0
            && position.y >= 0
            && (position.x as u32) < self.width
            && (position.y as u32) < self.height;
        in_bounds.then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    pub fn food_at(&self, position: GridPos) -> Option<f64> {
        self.index(position).map(|i| self.food[i])
    }

    pub fn temperature_at(&self, position: GridPos) -> Option<f64> {
        self.index(position).map(|i| self.temperature[i])
    }

    /// Scent cells above `threshold` as `(x, y, value)`.
    pub fn heatmap(&self, threshold: f64) -> Vec<(i32, i32, f64)> {
        heatmap_cells(&self.scent, self.width, threshold)
    }
}

/// Aggregates over the agent list and the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldStats {
    pub tick: Tick,
    pub agents_alive: usize,
    /// Dead agents still present in the snapshot.
    pub agents_dead: usize,
    pub total_spawned: u64,
    pub total_deaths: u64,
    pub total_reaped: u64,
    /// Means over living agents; zero when nobody is alive.
    pub mean_energy: f64,
    pub mean_temperature: f64,
    pub mean_valence: f64,
    pub food_total: f64,
    pub faults_this_tick: u64,
    pub total_faults: u64,
}

/// An external action as it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AppliedAction {
    pub sequence: u64,
    pub action: ExternalAction,
    /// Food actually added after capacity clamping.
    pub applied_amount: f64,
    pub applied_at: Tick,
}

/// The complete, immutable state of the world after one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub run_id: Uuid,
    pub tick: Tick,
    pub status: SchedulerStatus,
    pub agents: Vec<AgentSnapshot>,
    pub grid: GridSnapshot,
    pub stats: WorldStats,
    pub applied_actions: Vec<AppliedAction>,
}

impl WorldSnapshot {
    pub fn agent(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn alive(&self) -> impl Iterator<Item = &AgentSnapshot> {
        self.agents.iter().filter(|a| a.alive)
    }

    /// Whether the stats agree with the agent list.
    pub fn is_consistent(&self) -> bool {
        let alive = self.alive().count();
        alive == self.stats.agents_alive
            && self.agents.len() - alive == self.stats.agents_dead
            && self.stats.tick == self.tick
            && self.grid.food.len() == self.grid.width as usize * self.grid.height as usize
            && self.agents.windows(2).all(|w| w[0].id < w[1].id)
    }

    /// A short plain-text summary for observers that read prose.
    pub fn description(&self) -> String {
        let mut desc = format!(
            "Tick {}. Agents alive: {}. Agents dead: {}.",
            self.tick,
            self.stats.agents_alive,
            self.stats.total_deaths
        );
        if self.stats.agents_alive > 0 {
            desc.push_str(&format!(
                " Average agent temperature: {:.2}. Average energy: {:.2}.",
                self.stats.mean_temperature, self.stats.mean_energy
            ));
        }
        desc.push_str(&format!(" Food in world: {:.1}.", self.stats.food_total));
        desc
    }
}

impl WorldStats {
    pub(crate) fn summarize(tick: Tick, agents: &[AgentSnapshot], food_total: f64) -> Self {
        let living: Vec<&AgentSnapshot> = agents.iter().filter(|a| a.alive).collect();
        let n = living.len();
        let mean = |f: fn(&AgentSnapshot) -> f64| {
            if n == 0 {
                0.0
            } else {
                living.iter().map(|a| f(a)).sum::<f64>() / n as f64
            }
        };
        Self {
            tick,
            agents_alive: n,
            agents_dead: agents.len() - n,
            total_spawned: 0,
            total_deaths: 0,
            total_reaped: 0,
            mean_energy: mean(|a| a.energy),
            mean_temperature: mean(|a| a.temperature),
            mean_valence: mean(|a| a.valence),
            food_total,
            faults_this_tick: 0,
            total_faults: 0,
        }
    }
}
