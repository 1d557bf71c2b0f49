//! # Allostasis Runtime
//!
//! The world's grid, its tick loop, and the shared state that lets
//! readers and external actors work against a running world.
//!
//! - **Grid** - the spatial [`Environment`](allostasis_core::environment::Environment)
//! - **Simulation** - the per-tick algorithm over a population
//! - **Synchronizer** - snapshot publication and the external action queue
//! - **Scheduler** - the background tick thread and its state machine
//!
//! ## Quick Start
//!
//! ```rust
//! use allostasis_runtime::prelude::*;
//!
//! let config = SimulationConfig::default();
//! let mut sim = Simulation::from_config(&config).unwrap();
//! let sync = Synchronizer::new(sim.snapshot());
//!
//! sync.submit_action(ExternalAction::DropFood {
//!     position: GridPos::new(5, 5),
//!     amount: 20.0,
//! });
//! let snapshot = sim.run(10, &sync).unwrap();
//! assert_eq!(snapshot.tick, 10);
//! assert_eq!(snapshot.stats.agents_alive + snapshot.stats.agents_dead, snapshot.agents.len());
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;
pub mod sync;
pub mod prelude;
