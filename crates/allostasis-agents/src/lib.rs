//! # Allostasis Agents
//!
//! Active-inference agents that keep energy and temperature near their
//! set-points.
//!
//! - **AllostaticAgent** - the population member; owns physiology and mood
//! - **DecisionEngine** - scores every available action by expected free
//!   energy under a one-step model of the body and picks one
//! - **Affect** - turns the trend of the deficit into valence and precision
//! - **Spawner** - seeded creation of a starting population

pub mod affect;
pub mod allostatic;
pub mod decision;
pub mod spawn;
pub mod prelude;
