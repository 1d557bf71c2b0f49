//! Allostasis Core Prelude — convenient imports for common usage.
//!
//! ```rust
//! use allostasis_core::prelude::*;
//! ```

pub use crate::types::{
    Action, AgentId, CellView, Direction, ExternalAction, GridPos, LocalView, Tick,
};

pub use crate::physiology::{DeathCause, Physiology, PhysiologyParams, SurvivalBounds};

pub use crate::agent::Agent;
pub use crate::environment::Environment;

pub use crate::error::{
    AgentFault, AllostasisError, ConfigError, DecisionFault, Result, ValidationError,
};
