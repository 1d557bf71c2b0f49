//! # Allostasis
//!
//! Agents that keep their energy and temperature near preferred set-points
//! by active inference, living in a shared grid that an outside observer
//! can watch and perturb while the world runs.
//!
//! ## Quick Start
//!
//! ```rust
//! use allostasis::prelude::*;
//!
//! // Build a world from the default configuration
//! let config = SimulationConfig::default();
//! let mut world = Simulation::from_config(&config).unwrap();
//! let sync = Synchronizer::new(world.snapshot());
//!
//! // Perturb it from outside
//! assert!(sync.submit_action(ExternalAction::DropFood {
//!     position: GridPos::new(20, 20),
//!     amount: 30.0,
//! }));
//!
//! // Tick it and read what happened
//! let snapshot = world.run(25, &sync).unwrap();
//! println!("{}", snapshot.description());
//! assert_eq!(snapshot.tick, 25);
//! ```
//!
//! ## Architecture
//!
//! - [`allostasis_core`] - Shared types, the `Agent` and `Environment` traits, errors
//! - [`allostasis_agents`] - The allostatic agent and its decision engine
//! - [`allostasis_runtime`] - Grid, tick loop, snapshots, scheduler
//!
//! ## Key Concepts
//!
//! ### Expected free energy
//!
//! Each tick an agent predicts, for every available action, its energy and
//! temperature one step ahead and scores the action by
//!
//! | Term | Meaning |
//! |------|---------|
//! | pragmatic | negative weighted deviation from the set-points |
//! | epistemic | novelty of the target cell (low shared trail) |
//! | social | food scent at the target, only while hungry |
//!
//! ### Affect
//!
//! Mood (valence) integrates how fast the deficit is shrinking; it raises
//! or lowers the precision with which the agent commits to its best option.
//!
//! ### Shared state
//!
//! The world is owned by one tick thread. Everyone else sees immutable
//! snapshots and submits actions that are applied at the next tick.

// Re-export all subcrates
pub use allostasis_core as core;
pub use allostasis_agents as agents;
pub use allostasis_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use allostasis::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use allostasis_core::types::{
        Action, AgentId, CellView, Direction, ExternalAction, GridPos, LocalView, Tick,
    };
    pub use allostasis_core::physiology::{DeathCause, Physiology, PhysiologyParams, SurvivalBounds};

    // Core traits
    pub use allostasis_core::agent::Agent;
    pub use allostasis_core::environment::Environment;

    // Error types
    pub use allostasis_core::error::{AgentFault, AllostasisError, ConfigError, ValidationError};
    pub use allostasis_runtime::error::{SchedulerError, SimulationError};

    // Agents
    pub use allostasis_agents::affect::{Affect, AffectParams};
    pub use allostasis_agents::allostatic::AllostaticAgent;
    pub use allostasis_agents::decision::{Decision, DecisionEngine, DecisionParams, PolicyMode};
    pub use allostasis_agents::spawn::{PopulationSpec, Spawner};

    // Runtime
    pub use allostasis_runtime::config::{SchedulerConfig, SimulationConfig, WorldConfig};
    pub use allostasis_runtime::grid::Grid;
    pub use allostasis_runtime::scheduler::Scheduler;
    pub use allostasis_runtime::simulation::Simulation;
    pub use allostasis_runtime::snapshot::{AgentSnapshot, WorldSnapshot, WorldStats};
    pub use allostasis_runtime::sync::{ActionReceipt, SchedulerStatus, Synchronizer};
}
