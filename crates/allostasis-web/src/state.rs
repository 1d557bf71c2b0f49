//! Application state for the web server.
//!
//! Handlers share the world's [`Synchronizer`] and nothing else, so a
//! request never waits on a tick.

use allostasis_runtime::sync::Synchronizer;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<Synchronizer>,
}

impl AppState {
    pub fn new(sync: Arc<Synchronizer>) -> Self {
        Self { sync }
    }
}
