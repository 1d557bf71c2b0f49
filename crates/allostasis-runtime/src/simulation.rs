//! Simulation — the world and its per-tick algorithm.
//!
//! Each tick:
//! 1. The grid is checked for corruption; a corrupt world never ticks
//! 2. Queued external actions are applied in arrival order
//! 3. Every living agent, by ascending id, observes, decides and acts,
//!    then the physics runs on it and it leaves trail and scent
//! 4. The grid's signal fields decay
//! 5. Agents outside the survivable range die
//! 6. The tick counter advances and a snapshot is built
//!
//! A failing agent stays put for the tick; nothing it does can stop the
//! others or the next tick.

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::snapshot::*;
use crate::sync::{PendingAction, SchedulerStatus, Synchronizer};
use allostasis_agents::decision::DecisionEngine;
use allostasis_agents::spawn::Spawner;
use allostasis_core::agent::Agent;
use allostasis_core::environment::Environment;
use allostasis_core::error::AgentFault;
use allostasis_core::physiology::{PhysiologyParams, SurvivalBounds};
use allostasis_core::types::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Physics applied to each agent, shared by the whole tick.
#[derive(Debug, Clone, Copy)]
struct Physics {
    params: PhysiologyParams,
    radius: u32,
    trail_deposit: f64,
    scent_strength: f64,
}

impl Physics {
    /// One agent's turn. Returns the fault, if any, that made it stay.
    fn step_agent(&self, agent: &mut dyn Agent, grid: &mut Grid, seed: u64) -> Option<AgentFault> {
        let position = agent.position();
        let view = grid.observe(position, self.radius);

        let mut fault = None;
        let decided = panic::catch_unwind(AssertUnwindSafe(|| agent.decide(&view, seed)))
            .unwrap_or_else(|payload| Err(AgentFault::Internal(panic_message(payload.as_ref()))));
        let mut action = match decided {
            Ok(action) => action,
            Err(f) => {
                fault = Some(f);
                Action::Stay
            }
        };

        match action {
            Action::Move(_) => {
                let target = action.target(position);
                if grid.in_bounds(target) {
                    agent.set_position(target);
                } else {
                    fault = Some(AgentFault::RejectedAction(format!(
                        "move from {} to {} leaves the grid",
                        position, target
                    )));
                    action = Action::Stay;
                }
            }
            Action::Consume => {
                let available = grid.food_at(position).unwrap_or(0.0);
                let meal = self.params.meal_size(agent.physiology().energy, available);
                let eaten = grid.consume(position, meal);
                let body = agent.physiology_mut();
                body.energy += eaten;
                if eaten > self.params.food_signal_threshold {
                    body.food_signal = self.params.food_signal_duration;
                }
            }
            Action::Stay => {}
        }

        let here = agent.position();
        let ambient = grid.temperature_at(here);
        let body = agent.physiology_mut();
        if let Some(ambient) = ambient {
            body.temperature = self.params.relax_temperature(body.temperature, ambient);
        }
        body.energy -= self.params.metabolism + self.params.move_cost * action.movement_cost() as f64;

        let signal = body.food_signal;
        if signal > 0.0 {
            body.food_signal = (signal - 1.0).max(0.0);
        }
        grid.deposit_trail(here, self.trail_deposit);
        if signal > 0.0 && self.params.food_signal_duration > 0.0 {
            grid.emit_scent(here, signal / self.params.food_signal_duration * self.scent_strength);
        }

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| agent.after_tick())) {
            fault.get_or_insert(AgentFault::Internal(panic_message(payload.as_ref())));
        }
        fault
    }
}

/// Text of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown payload".to_string());
    format!("agent panicked: {}", detail)
}

/// Deterministic per-agent decision seed.
fn decision_seed(world_seed: u64, tick: Tick, id: AgentId) -> u64 {
    let mut z = world_seed
        ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ id.0.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// The world: grid, population and counters. Owned by one thread.
pub struct Simulation {
    run_id: Uuid,
    tick: Tick,
    seed: u64,
    grid: Grid,
    agents: Vec<Box<dyn Agent>>,
    next_id: u64,
    physics: Physics,
    survival: SurvivalBounds,
    reap_dead_after: Option<u64>,
    total_deaths: u64,
    total_reaped: u64,
    total_faults: u64,
    faults_this_tick: u64,
    last_applied: Vec<AppliedAction>,
}

impl Simulation {
    /// Generate the grid and population described by `config`.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.world.seed);
        let grid = Grid::generate(&config.world, &mut rng);
        let mut sim = Self::with_grid(grid, config);

        let engine = DecisionEngine::new(config.physiology, config.decision);
        let spawner = Spawner::new(config.population, engine, config.affect);
        let (width, height) = (config.world.width, config.world.height);
        for _ in 0..config.population.count {
            sim.spawn(|id| spawner.spawn_one(id, &mut rng, width, height));
        }

        info!(
            run_id = %sim.run_id,
            width,
            height,
            agents = sim.agents.len(),
            seed = config.world.seed,
            "world created"
        );
        Ok(sim)
    }

    /// A world over an existing grid with no agents yet.
    ///
    /// Physics, survival bounds and the decision seed come from `config`;
    /// its world generation settings are ignored.
    pub fn with_grid(grid: Grid, config: &SimulationConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tick: 0,
            seed: config.world.seed,
            grid,
            agents: Vec::new(),
            next_id: 0,
            physics: Physics {
                params: config.physiology,
                radius: config.world.observation_radius,
                trail_deposit: config.world.trail_deposit,
                scent_strength: config.world.scent_strength,
            },
            survival: config.survival,
            reap_dead_after: config.scheduler.reap_dead_after,
            total_deaths: 0,
            total_reaped: 0,
            total_faults: 0,
            faults_this_tick: 0,
            last_applied: Vec::new(),
        }
    }

    /// Add an agent built with the next free id.
    pub fn spawn<A, F>(&mut self, build: F) -> AgentId
    where
        A: Agent + 'static,
        F: FnOnce(AgentId) -> A,
    {
        let id = AgentId(self.next_id);
        self.next_id += 1;
        let agent = build(id);
        debug_assert_eq!(agent.id(), id, "agents must keep the id they were given");
        debug!(agent = %id, agent_type = agent.agent_type(), position = %agent.position(), "spawned");
        self.agents.push(Box::new(agent));
        id
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn agents(&self) -> impl Iterator<Item = &dyn Agent> {
        self.agents.iter().map(|a| &**a)
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_alive()).count()
    }

    pub fn total_faults(&self) -> u64 {
        self.total_faults
    }

    /// Run one tick with no external actions.
    pub fn step_once(&mut self) -> Result<WorldSnapshot> {
        self.tick_with(Vec::new())
    }

    /// Run one tick, applying `pending` first.
    pub fn tick_with(&mut self, pending: Vec<PendingAction>) -> Result<WorldSnapshot> {
        self.grid.validate()?;
        self.run_tick(pending);
        Ok(self.snapshot())
    }

    /// Run one tick against a synchronizer: drain its queue, tick, publish.
    ///
    /// The queue is only drained once the grid passed its check, so a
    /// corrupt world keeps the actions it was sent.
    pub fn step(&mut self, sync: &Synchronizer) -> Result<Arc<WorldSnapshot>> {
        self.grid.validate()?;
        let pending = sync.drain();
        self.run_tick(pending);
        Ok(sync.publish(self.snapshot()))
    }

    /// Run `ticks` ticks synchronously, publishing each one.
    pub fn run(&mut self, ticks: u64, sync: &Synchronizer) -> Result<Arc<WorldSnapshot>> {
        let mut latest = sync.get_snapshot();
        for _ in 0..ticks {
            latest = self.step(sync)?;
        }
        Ok(latest)
    }

    fn run_tick(&mut self, pending: Vec<PendingAction>) {
        let tick = self.tick + 1;

        let mut applied = Vec::with_capacity(pending.len());
        for p in pending {
            match p.action {
                ExternalAction::DropFood { position, amount } => {
                    let added = self.grid.apply_drop(position, amount);
                    if added < amount {
                        debug!(sequence = p.sequence, requested = amount, added, "drop clamped to capacity");
                    }
                    applied.push(AppliedAction {
                        sequence: p.sequence,
                        action: p.action,
                        applied_amount: added,
                        applied_at: tick,
                    });
                }
            }
        }

        let physics = self.physics;
        let seed = self.seed;
        let mut faults = 0;
        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            let id = agent.id();
            if let Some(fault) = physics.step_agent(agent.as_mut(), &mut self.grid, decision_seed(seed, tick, id)) {
                warn!(agent = %id, tick, error = %fault, "agent fault, staying put");
                faults += 1;
            }
        }

        self.grid.advance();

        for agent in self.agents.iter_mut().filter(|a| a.is_alive()) {
            let body = agent.physiology();
            if let Some(cause) = self.survival.breach(body.energy, body.temperature) {
                if agent.physiology_mut().kill(cause, tick) {
                    self.total_deaths += 1;
                    info!(agent = %agent.id(), tick, ?cause, "agent died");
                }
            }
        }

        self.tick = tick;
        if let Some(after) = self.reap_dead_after {
            self.reap_where(|died_at| died_at + after <= tick);
        }

        self.faults_this_tick = faults;
        self.total_faults += faults;
        self.last_applied = applied;
        debug!(tick, alive = self.alive_count(), faults, "tick complete");
    }

    /// Remove every dead agent. Returns how many were removed.
    pub fn reap_dead(&mut self) -> usize {
        self.reap_where(|_| true)
    }

    fn reap_where(&mut self, expired: impl Fn(Tick) -> bool) -> usize {
        let before = self.agents.len();
        self.agents.retain(|a| {
            let body = a.physiology();
            body.alive || !body.died_at.map_or(true, &expired)
        });
        let removed = before - self.agents.len();
        if removed > 0 {
            self.total_reaped += removed as u64;
            debug!(removed, tick = self.tick, "reaped dead agents");
        }
        removed
    }

    /// An immutable copy of the world as of the last completed tick.
    pub fn snapshot(&self) -> WorldSnapshot {
        let agents: Vec<AgentSnapshot> = self
            .agents
            .iter()
            .map(|a| {
                let body = a.physiology();
                AgentSnapshot {
                    id: a.id(),
                    agent_type: a.agent_type().to_string(),
                    position: a.position(),
                    energy: body.energy,
                    temperature: body.temperature,
                    valence: body.valence,
                    precision: body.precision,
                    alive: body.alive,
                    age: a.age(),
                    food_signal: body.food_signal,
                    died_at: body.died_at,
                    death_cause: body.death_cause,
                }
            })
            .collect();

        let mut stats = WorldStats::summarize(self.tick, &agents, self.grid.total_food());
        stats.total_spawned = self.next_id;
        stats.total_deaths = self.total_deaths;
        stats.total_reaped = self.total_reaped;
        stats.faults_this_tick = self.faults_this_tick;
        stats.total_faults = self.total_faults;

        WorldSnapshot {
            run_id: self.run_id,
            tick: self.tick,
            status: SchedulerStatus::Idle,
            agents,
            grid: GridSnapshot {
                width: self.grid.width(),
                height: self.grid.height(),
                food: self.grid.food().to_vec(),
                temperature: self.grid.temperature().to_vec(),
                scent: self.grid.scent().to_vec(),
                trail: self.grid.trail().to_vec(),
            },
            stats,
            applied_actions: self.last_applied.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allostasis_agents::allostatic::AllostaticAgent;
    use allostasis_core::physiology::{DeathCause, Physiology};

    /// An agent whose policy always fails.
    struct Broken {
        id: AgentId,
        position: GridPos,
        body: Physiology,
        ticks: Tick,
    }

    impl Broken {
        fn new(id: AgentId, position: GridPos) -> Self {
            Self {
                id,
                position,
                body: Physiology::new(80.0, 25.0, 6.0),
                ticks: 0,
            }
        }
    }

    impl Agent for Broken {
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
            &self.body
        }
        fn physiology_mut(&mut self) -> &mut Physiology {
            &mut self.body
        }
        fn agent_type(&self) -> &str {
            "broken"
        }
        fn decide(&mut self, _view: &LocalView, _seed: u64) -> std::result::Result<Action, AgentFault> {
            Err(AgentFault::Internal("policy exploded".into()))
        }
        fn after_tick(&mut self) {
            self.ticks += 1;
        }
        fn age(&self) -> Tick {
            self.ticks
        }
    }

    /// Always tries to walk west.
    struct Walker(Broken);

    impl Agent for Walker {
        fn id(&self) -> AgentId {
            self.0.id
        }
        fn position(&self) -> GridPos {
            self.0.position
        }
        fn set_position(&mut self, position: GridPos) {
            self.0.position = position;
        }
        fn physiology(&self) -> &Physiology {
            &self.0.body
        }
        fn physiology_mut(&mut self) -> &mut Physiology {
            &mut self.0.body
        }
        fn agent_type(&self) -> &str {
            "walker"
        }
        fn decide(&mut self, _view: &LocalView, _seed: u64) -> std::result::Result<Action, AgentFault> {
            Ok(Action::Move(Direction::West))
        }
        fn after_tick(&mut self) {
            self.0.ticks += 1;
        }
        fn age(&self) -> Tick {
            self.0.ticks
        }
    }

    /// Panics whenever it is asked to decide.
    struct Panicky(Broken);

    impl Agent for Panicky {
        fn id(&self) -> AgentId {
            self.0.id
        }
        fn position(&self) -> GridPos {
            self.0.position
        }
        fn set_position(&mut self, position: GridPos) {
            self.0.position = position;
        }
        fn physiology(&self) -> &Physiology {
            &self.0.body
        }
        fn physiology_mut(&mut self) -> &mut Physiology {
            &mut self.0.body
        }
        fn agent_type(&self) -> &str {
            "panicky"
        }
        fn decide(&mut self, _view: &LocalView, _seed: u64) -> std::result::Result<Action, AgentFault> {
            panic!("policy blew up");
        }
        fn after_tick(&mut self) {
            self.0.ticks += 1;
        }
        fn age(&self) -> Tick {
            self.0.ticks
        }
    }

    fn warm_world() -> Simulation {
        Simulation::with_grid(Grid::uniform(6, 6, 25.0), &SimulationConfig::default())
    }

    #[test]
    fn tick_advances_simulation() {
        let mut sim = warm_world();
        sim.spawn(|id| AllostaticAgent::with_defaults(id, GridPos::new(2, 2)));
        let snap = sim.step_once().unwrap();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.agents[0].age, 1);
        assert!(snap.is_consistent());
    }

    #[test]
    fn faulty_agent_stays_and_others_continue() {
        let mut sim = warm_world();
        let broken = sim.spawn(|id| Broken::new(id, GridPos::new(1, 1)));
        let healthy = sim.spawn(|id| AllostaticAgent::with_defaults(id, GridPos::new(4, 4)));

        for _ in 0..3 {
            sim.step_once().unwrap();
        }
        let snap = sim.snapshot();
        let b = snap.agent(broken).unwrap();
        assert_eq!(b.position, GridPos::new(1, 1));
        assert_eq!(b.age, 3, "faulty agent still gets physics and after_tick");
        assert!(b.energy < 80.0, "metabolism still applies");
        assert_eq!(snap.agent(healthy).unwrap().age, 3);
        assert_eq!(snap.stats.faults_this_tick, 1);
        assert_eq!(snap.stats.total_faults, 3);
    }

    #[test]
    fn panicking_agent_is_isolated() {
        let mut sim = warm_world();
        let panicky = sim.spawn(|id| Panicky(Broken::new(id, GridPos::new(1, 1))));
        let healthy = sim.spawn(|id| AllostaticAgent::with_defaults(id, GridPos::new(4, 4)));

        for _ in 0..3 {
            sim.step_once().unwrap();
        }
        let snap = sim.snapshot();
        assert_eq!(snap.tick, 3);
        let p = snap.agent(panicky).unwrap();
        assert_eq!(p.position, GridPos::new(1, 1));
        assert_eq!(p.age, 3);
        assert_eq!(snap.agent(healthy).unwrap().age, 3);
        assert_eq!(snap.stats.faults_this_tick, 1);
        assert_eq!(sim.total_faults(), 3);
    }

    #[test]
    fn panic_message_is_kept() {
        let caught = panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "agent panicked: boom 7");
        let caught = panic::catch_unwind(|| panic!("plain")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "agent panicked: plain");
    }

    #[test]
    fn off_grid_move_is_rejected() {
        let mut sim = warm_world();
        let id = sim.spawn(|id| Walker(Broken::new(id, GridPos::new(1, 3))));
        sim.step_once().unwrap();
        let snap = sim.step_once().unwrap();
        assert_eq!(snap.agent(id).unwrap().position, GridPos::new(0, 3));
        assert_eq!(snap.stats.faults_this_tick, 1, "second step west leaves the grid");
        assert_eq!(sim.total_faults(), 1);
    }

    #[test]
    fn starving_agent_dies_once() {
        let mut sim = warm_world();
        let id = sim.spawn(|id| {
            let mut agent = AllostaticAgent::with_defaults(id, GridPos::new(3, 3));
            agent.physiology_mut().energy = 0.2;
            agent
        });

        let first = sim.step_once().unwrap();
        assert_eq!(first.agent(id).unwrap().energy, 0.2 - 0.15);
        let second = sim.step_once().unwrap();
        let dead = second.agent(id).unwrap();
        assert!(!dead.alive);
        assert_eq!(dead.died_at, Some(2));
        assert_eq!(dead.death_cause, Some(DeathCause::Starvation));
        assert_eq!(dead.energy, 0.0);

        let third = sim.step_once().unwrap();
        let still = third.agent(id).unwrap();
        assert_eq!(still.died_at, Some(2));
        assert_eq!(still.age, dead.age, "dead agents are never processed again");
        assert_eq!(third.stats.total_deaths, 1);
        assert_eq!(sim.reap_dead(), 1);
        assert!(sim.snapshot().agents.is_empty());
    }

    #[test]
    fn dead_agents_reaped_after_delay() {
        let mut config = SimulationConfig::default();
        config.scheduler.reap_dead_after = Some(2);
        let mut sim = Simulation::with_grid(Grid::uniform(4, 4, 25.0), &config);
        sim.spawn(|id| {
            let mut agent = AllostaticAgent::with_defaults(id, GridPos::new(1, 1));
            agent.physiology_mut().energy = 0.1;
            agent
        });

        let died = sim.step_once().unwrap();
        assert_eq!(died.stats.agents_dead, 1);
        assert_eq!(sim.step_once().unwrap().agents.len(), 1);
        let reaped = sim.step_once().unwrap();
        assert!(reaped.agents.is_empty());
        assert_eq!(reaped.stats.total_reaped, 1);
    }

    #[test]
    fn eating_broadcasts_scent() {
        let mut sim = warm_world();
        let p = GridPos::new(2, 2);
        sim.grid_mut().set_food(p, 50.0);
        let id = sim.spawn(|id| {
            let mut agent = AllostaticAgent::with_defaults(id, p);
            agent.physiology_mut().energy = 30.0;
            agent.physiology_mut().temperature = 25.0;
            agent
        });

        let snap = sim.step_once().unwrap();
        let agent = snap.agent(id).unwrap();
        assert_eq!(agent.position, p, "hungry agent on food should eat, not walk");
        assert!((agent.energy - (30.0 + 10.0 - 0.15)).abs() < 1e-9);
        assert_eq!(snap.grid.food_at(p), Some(40.0));
        assert!(snap.grid.scent[sim.grid().index(p).unwrap()] > 0.0);
    }

    #[test]
    fn corrupt_grid_stops_the_tick() {
        let mut sim = warm_world();
        sim.grid_mut().set_temperature(GridPos::new(0, 0), f64::INFINITY);
        assert!(sim.step_once().is_err());
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn decision_seeds_differ_per_agent_and_tick() {
        let a = decision_seed(42, 1, AgentId(0));
        assert_ne!(a, decision_seed(42, 1, AgentId(1)));
        assert_ne!(a, decision_seed(42, 2, AgentId(0)));
        assert_eq!(a, decision_seed(42, 1, AgentId(0)));
    }
}
