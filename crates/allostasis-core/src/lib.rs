//! # Allostasis Core
//!
//! Core traits and types for allostatic agent simulation.
//!
//! Agents regulate two internal variables, energy and temperature, inside a
//! shared grid of food and ambient temperature. This crate defines the
//! vocabulary every other crate shares:
//!
//! - [`agent::Agent`] - an individual that observes and decides
//! - [`environment::Environment`] - the spatial field it lives in
//! - [`physiology`] - the regulated variables, their dynamics and bounds
//! - [`types`] - ids, coordinates, actions, observations
//! - [`error`] - validation errors and per-agent faults
//!
//! ## Quick Start
//!
//! ```rust
//! use allostasis_core::prelude::*;
//!
//! let pos = GridPos::new(3, 4);
//! assert_eq!(pos.step(Direction::North), GridPos::new(3, 5));
//!
//! let bounds = SurvivalBounds::default();
//! assert_eq!(bounds.breach(0.0, 20.0), Some(DeathCause::Starvation));
//! ```

pub mod agent;
pub mod environment;
pub mod error;
pub mod physiology;
pub mod types;
pub mod prelude;
