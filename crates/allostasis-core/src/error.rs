//! Error types for Allostasis operations.
//!
//! Validation errors are returned to external callers as declined actions;
//! agent faults are isolated to one agent for one tick. Neither is ever
//! allowed to stop the world.

use crate::types::GridPos;
use thiserror::Error;

/// Result type for Allostasis operations.
pub type Result<T> = std::result::Result<T, AllostasisError>;

/// Top-level error for Allostasis operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllostasisError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("agent fault: {0}")]
    Agent(#[from] AgentFault),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Why an external action was declined at the submission boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("position {position} is outside the {width}x{height} grid")]
    OutOfBounds {
        position: GridPos,
        width: u32,
        height: u32,
    },

    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(f64),

    #[error("amount must be finite, got {0}")]
    NonFiniteAmount(f64),
}

/// A failure while one agent was deciding or acting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentFault {
    #[error("malformed observation: {0}")]
    MalformedObservation(String),

    #[error("action rejected by the world: {0}")]
    RejectedAction(String),

    #[error("{0}")]
    Internal(String),
}

/// Fault raised by a decision policy.
pub type DecisionFault = AgentFault;

impl AgentFault {
    pub fn malformed(reason: impl Into<String>) -> Self {
        AgentFault::MalformedObservation(reason.into())
    }
}

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{field} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl ConfigError {
    pub fn invalid(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message_names_grid() {
        let err = ValidationError::OutOfBounds {
            position: GridPos::new(40, 20),
            width: 40,
            height: 40,
        };
        assert_eq!(err.to_string(), "position (40, 20) is outside the 40x40 grid");
    }

    #[test]
    fn wraps_into_top_level() {
        let err: AllostasisError = ValidationError::NonPositiveAmount(-1.0).into();
        assert!(matches!(err, AllostasisError::Validation(_)));
        assert!(err.to_string().starts_with("validation error"));
    }
}
