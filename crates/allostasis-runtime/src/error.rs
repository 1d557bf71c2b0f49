//! Runtime error types.

use crate::sync::SchedulerStatus;
use allostasis_core::error::ConfigError;
use thiserror::Error;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Failures that stop the world.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// World state failed its integrity check; the tick was not run.
    #[error("world state corrupted: {0}")]
    Corrupted(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Illegal scheduler transitions.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("scheduler already started (status {0})")]
    AlreadyStarted(SchedulerStatus),

    #[error("scheduler already stopped")]
    AlreadyStopped,

    #[error("failed to spawn tick thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("tick thread panicked")]
    Panicked,
}
