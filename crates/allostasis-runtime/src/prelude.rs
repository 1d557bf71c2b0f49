//! Allostasis Runtime Prelude — convenient imports for common usage.

pub use allostasis_core::prelude::*;

pub use crate::config::{SchedulerConfig, SimulationConfig, WorldConfig};
pub use crate::error::{SchedulerError, SimulationError};
pub use crate::grid::{FieldDecay, Grid};
pub use crate::scheduler::Scheduler;
pub use crate::simulation::Simulation;
pub use crate::snapshot::{AgentSnapshot, AppliedAction, GridSnapshot, WorldSnapshot, WorldStats};
pub use crate::sync::{ActionReceipt, PendingAction, SchedulerStatus, Synchronizer};
