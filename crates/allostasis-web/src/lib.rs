//! # Allostasis Web API
//!
//! A thin HTTP layer over a running world. Handlers only read published
//! snapshots and submit external actions; all simulation happens on the
//! scheduler's tick thread.
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run -p allostasis-web -- --port 5000
//! curl http://localhost:5000/api/state
//! ```
//!
//! ## API Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/api/state` | Tick, status, agents, food field and stats |
//! | POST | `/api/action/drop_food` | Queue a food drop for the next tick |
//! | GET | `/api/grid/heatmap` | Food-scent cells above 0.1 |
//! | GET | `/api/grid/description` | Plain-text summary for observers |
//! | GET | `/api/health` | Scheduler status |

pub mod routes;
pub mod state;

pub use state::AppState;
