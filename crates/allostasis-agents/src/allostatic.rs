//! Allostatic Agent — the default population member.
//!
//! Keeps its own physiology and mood, and delegates every choice to a
//! [`DecisionEngine`]. The runtime applies the physics; the agent only
//! decides and, after each tick, re-integrates its affect.

use crate::affect::{Affect, AffectParams};
use crate::decision::{Decision, DecisionEngine};
use allostasis_core::agent::Agent;
use allostasis_core::error::AgentFault;
use allostasis_core::physiology::Physiology;
use allostasis_core::types::*;

pub struct AllostaticAgent {
    id: AgentId,
    position: GridPos,
    age_ticks: Tick,
    physiology: Physiology,
    engine: DecisionEngine,
    affect: Affect,
    affect_params: AffectParams,
    last_decision: Option<Decision>,
}

impl AllostaticAgent {
    pub fn new(
        id: AgentId,
        position: GridPos,
        energy: f64,
        temperature: f64,
        engine: DecisionEngine,
        affect_params: AffectParams,
    ) -> Self {
        Self {
            id,
            position,
            age_ticks: 0,
            physiology: Physiology::new(energy, temperature, affect_params.base_precision),
            engine,
            affect: Affect::new(),
            affect_params,
            last_decision: None,
        }
    }

    /// An agent with default parameters, starting cold and moderately fed.
    pub fn with_defaults(id: AgentId, position: GridPos) -> Self {
        Self::new(
            id,
            position,
            70.0,
            10.0,
            DecisionEngine::default(),
            AffectParams::default(),
        )
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// The decision taken on the most recent successful tick.
    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }
}

impl Agent for AllostaticAgent {
    fn id(&self) -> AgentId {
        self.id
    }

    fn position(&self) -> GridPos {
        self.position
    }

    fn set_position(&mut self, position: GridPos) {
        self.position = position;
    }

    fn physiology(&self) -> &Physiology {
        &self.physiology
    }

    fn physiology_mut(&mut self) -> &mut Physiology {
        &mut self.physiology
    }

    fn agent_type(&self) -> &str {
        "allostatic"
    }

    fn decide(&mut self, view: &LocalView, seed: u64) -> Result<Action, AgentFault> {
        if !self.physiology.alive {
            return Ok(Action::Stay);
        }
        if view.center != self.position {
            return Err(AgentFault::malformed(format!(
                "view centred on {} but agent is at {}",
                view.center, self.position
            )));
        }
        let decision = self.engine.decide(&self.physiology, view, seed)?;
        let action = decision.action;
        self.last_decision = Some(decision);
        Ok(action)
    }

    fn after_tick(&mut self) {
        self.age_ticks += 1;
        let weights = self.engine.params();
        let deficit = self.physiology.deficit(
            self.engine.physiology(),
            weights.weight_temperature,
            weights.weight_energy,
        );
        self.affect
            .integrate(&mut self.physiology, deficit, &self.affect_params);
    }

    fn age(&self) -> Tick {
        self.age_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(center: GridPos, temperature: f64) -> LocalView {
        let mut cells = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                cells.push(CellView {
                    position: GridPos::new(center.x + dx, center.y + dy),
                    food: 0.0,
                    temperature,
                    scent: 0.0,
                    trail: 0.0,
                });
            }
        }
        LocalView {
            center,
            radius: 1,
            cells,
        }
    }

    #[test]
    fn rejects_view_for_another_cell() {
        let mut agent = AllostaticAgent::with_defaults(AgentId(1), GridPos::new(4, 4));
        let view = view_at(GridPos::new(5, 5), 20.0);
        assert!(agent.decide(&view, 0).is_err());
        assert!(agent.last_decision().is_none());
    }

    #[test]
    fn dead_agent_stays() {
        let mut agent = AllostaticAgent::with_defaults(AgentId(1), GridPos::new(4, 4));
        agent.physiology_mut().alive = false;
        let view = view_at(GridPos::new(9, 9), 20.0);
        assert_eq!(agent.decide(&view, 0).unwrap(), Action::Stay);
    }

    #[test]
    fn decision_is_remembered() {
        let mut agent = AllostaticAgent::with_defaults(AgentId(3), GridPos::new(4, 4));
        let view = view_at(GridPos::new(4, 4), 25.0);
        let action = agent.decide(&view, 0).unwrap();
        assert_eq!(agent.last_decision().map(|d| d.action), Some(action));
    }

    #[test]
    fn after_tick_ages_and_updates_affect() {
        let mut agent = AllostaticAgent::with_defaults(AgentId(1), GridPos::new(0, 0));
        agent.after_tick();
        agent.physiology_mut().temperature = 15.0;
        agent.after_tick();
        assert_eq!(agent.age(), 2);
        assert!(
            agent.physiology().valence > 0.0,
            "warming up should feel good, valence {}",
            agent.physiology().valence
        );
    }
}
