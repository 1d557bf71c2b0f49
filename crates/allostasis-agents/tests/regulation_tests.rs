//! Closed-loop regulation tests: an agent and a small hand-built world.

use allostasis_agents::prelude::*;
use allostasis_core::agent::Agent;
use allostasis_core::physiology::PhysiologyParams;
use allostasis_core::types::*;

/// A tiny world: ambient temperature rises with x, optional food cells.
struct Strip {
    width: i32,
    height: i32,
    food: Vec<f64>,
}

impl Strip {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            food: vec![0.0; (width * height) as usize],
        }
    }

    fn idx(&self, p: GridPos) -> usize {
        (p.y * self.width + p.x) as usize
    }

    fn temperature(&self, p: GridPos) -> f64 {
        10.0 + 2.0 * p.x as f64
    }

    fn view(&self, center: GridPos) -> LocalView {
        let mut cells = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let p = GridPos::new(center.x + dx, center.y + dy);
                if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
                    continue;
                }
                cells.push(CellView {
                    position: p,
                    food: self.food[self.idx(p)],
                    temperature: self.temperature(p),
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

    /// One tick for one agent, the way the runtime applies it.
    fn step(&mut self, agent: &mut AllostaticAgent, params: &PhysiologyParams) -> Action {
        let view = self.view(agent.position());
        let action = agent.decide(&view, 0).unwrap();
        match action {
            Action::Move(_) => agent.set_position(action.target(agent.position())),
            Action::Consume => {
                let idx = self.idx(agent.position());
                let meal = params.meal_size(agent.physiology().energy, self.food[idx]);
                self.food[idx] -= meal;
                agent.physiology_mut().energy += meal;
            }
            Action::Stay => {}
        }
        let ambient = self.temperature(agent.position());
        let body = agent.physiology_mut();
        body.temperature = params.relax_temperature(body.temperature, ambient);
        body.energy -= params.metabolism + params.move_cost * action.movement_cost() as f64;
        agent.after_tick();
        action
    }
}

#[test]
fn cold_agent_walks_toward_warmth() {
    let params = PhysiologyParams::default();
    let mut world = Strip::new(10, 3);
    let mut agent = AllostaticAgent::with_defaults(AgentId(0), GridPos::new(0, 1));
    let start_gap = (agent.physiology().temperature - params.preferred_temperature).abs();

    let first = world.step(&mut agent, &params);
    assert_eq!(
        first,
        Action::Move(Direction::East),
        "orthogonal step toward warmth should beat equally warm diagonals"
    );
    for _ in 0..30 {
        world.step(&mut agent, &params);
    }

    let end_gap = (agent.physiology().temperature - params.preferred_temperature).abs();
    assert!(agent.position().x > 5, "agent should be in the warm half, at {}", agent.position());
    assert!(
        end_gap < start_gap,
        "temperature error should shrink: {} -> {}",
        start_gap,
        end_gap
    );
    assert!(agent.physiology().alive);
}

#[test]
fn hungry_agent_steps_onto_food_then_eats() {
    let params = PhysiologyParams::default();
    let mut world = Strip::new(5, 3);
    let food_cell = GridPos::new(3, 1);
    let idx = world.idx(food_cell);
    world.food[idx] = 50.0;

    // Start at the preferred temperature so hunger dominates.
    let mut agent = AllostaticAgent::new(
        AgentId(0),
        GridPos::new(2, 1),
        30.0,
        params.preferred_temperature,
        DecisionEngine::default(),
        AffectParams::default(),
    );

    assert_eq!(world.step(&mut agent, &params), Action::Move(Direction::East));
    assert_eq!(agent.position(), food_cell);
    assert_eq!(world.step(&mut agent, &params), Action::Consume);
    assert!(
        agent.physiology().energy > 35.0,
        "one meal should restore energy, got {}",
        agent.physiology().energy
    );
    assert!(world.food[idx] < 50.0);
}

#[test]
fn softmax_population_is_reproducible() {
    let engine = DecisionEngine::new(
        PhysiologyParams::default(),
        DecisionParams {
            policy: PolicyMode::Softmax,
            ..Default::default()
        },
    );
    let run = || {
        let world = Strip::new(8, 8);
        let mut agent = AllostaticAgent::new(
            AgentId(7),
            GridPos::new(4, 4),
            60.0,
            20.0,
            engine,
            AffectParams::default(),
        );
        let mut trace = Vec::new();
        for tick in 0..20u64 {
            let view = world.view(agent.position());
            let action = agent.decide(&view, tick.wrapping_mul(31) ^ 7).unwrap();
            if let Action::Move(_) = action {
                agent.set_position(action.target(agent.position()));
            }
            agent.after_tick();
            trace.push(action);
        }
        trace
    };
    assert_eq!(run(), run(), "same seeds must give the same trajectory");
}
