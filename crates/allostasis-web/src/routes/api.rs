//! REST endpoints.

use crate::state::AppState;
use allostasis_core::types::{AgentId, ExternalAction, GridPos, Tick};
use allostasis_runtime::snapshot::{WorldSnapshot, WorldStats};
use allostasis_runtime::sync::SchedulerStatus;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

/// Scent below this is left out of the heatmap.
const HEATMAP_THRESHOLD: f64 = 0.1;

/// Food dropped when a request names no amount.
fn default_drop_amount() -> f64 {
    20.0
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentView {
    pub id: AgentId,
    pub position: GridPos,
    pub energy: f64,
    pub temperature: f64,
    pub valence: f64,
    pub precision: f64,
    pub alive: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FoodField {
    pub width: u32,
    pub height: u32,
    /// Row-major, `y * width + x`.
    pub food: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateResponse {
    pub tick: Tick,
    pub status: SchedulerStatus,
    pub run_id: Uuid,
    pub agents: Vec<AgentView>,
    pub grid: FoodField,
    pub stats: WorldStats,
}

impl From<&WorldSnapshot> for StateResponse {
    fn from(snapshot: &WorldSnapshot) -> Self {
        Self {
            tick: snapshot.tick,
            status: snapshot.status,
            run_id: snapshot.run_id,
            agents: snapshot
                .agents
                .iter()
                .map(|a| AgentView {
                    id: a.id,
                    position: a.position,
                    energy: a.energy,
                    temperature: a.temperature,
                    valence: a.valence,
                    precision: a.precision,
                    alive: a.alive,
                })
                .collect(),
            grid: FoodField {
                width: snapshot.grid.width,
                height: snapshot.grid.height,
                food: snapshot.grid.food.clone(),
            },
            stats: snapshot.stats.clone(),
        }
    }
}

/// Get the latest published world state.
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let snapshot = state.sync.get_snapshot();
    Json(StateResponse::from(&*snapshot))
}

/// Drop-food request body.
///
/// Accepts `{ "position": { "x": 3, "y": 4 }, "amount": 10 }` and the flat
/// `{ "x": 3, "y": 4, "amount": 10 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DropFoodRequest {
    Nested {
        position: GridPos,
        #[serde(default = "default_drop_amount")]
        amount: f64,
    },
    Flat {
        x: i32,
        y: i32,
        #[serde(default = "default_drop_amount")]
        amount: f64,
    },
}

impl DropFoodRequest {
    pub fn into_action(self) -> ExternalAction {
        match self {
            DropFoodRequest::Nested { position, amount } => ExternalAction::DropFood { position, amount },
            DropFoodRequest::Flat { x, y, amount } => ExternalAction::DropFood {
                position: GridPos::new(x, y),
                amount,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DropFoodResponse {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_at_or_after: Option<Tick>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DropFoodResponse {
    fn declined(error: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::BAD_REQUEST,
            Json(Self {
                accepted: false,
                sequence: None,
                apply_at_or_after: None,
                error: Some(error.into()),
            }),
        )
    }
}

/// Queue a food drop for the next tick.
pub async fn drop_food(
    State(state): State<AppState>,
    body: Result<Json<DropFoodRequest>, JsonRejection>,
) -> (StatusCode, Json<DropFoodResponse>) {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "malformed drop_food body");
            return DropFoodResponse::declined(rejection.body_text());
        }
    };

    match state.sync.try_submit(request.into_action()) {
        Ok(receipt) => (
            StatusCode::OK,
            Json(DropFoodResponse {
                accepted: true,
                sequence: Some(receipt.sequence),
                apply_at_or_after: Some(receipt.apply_at_or_after),
                error: None,
            }),
        ),
        Err(e) => {
            warn!(error = %e, "drop_food declined");
            DropFoodResponse::declined(e.to_string())
        }
    }
}

/// Food-scent cells above the threshold as `[x, y, value]`.
pub async fn get_heatmap(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.sync.get_snapshot();
    let cells: Vec<(i32, i32, f64)> = snapshot
        .grid
        .heatmap(HEATMAP_THRESHOLD)
        .into_iter()
        .map(|(x, y, v)| (x, y, (v * 100.0).round() / 100.0))
        .collect();
    Json(json!({
        "tick": snapshot.tick,
        "heatmap": cells,
        "dims": [snapshot.grid.width, snapshot.grid.height],
    }))
}

/// Short text summary for observers that read prose.
pub async fn get_description(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.sync.get_snapshot();
    Json(json!({
        "tick": snapshot.tick,
        "description": snapshot.description(),
    }))
}

/// Scheduler status and queue depth.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.sync.get_snapshot();
    Json(json!({
        "status": state.sync.status(),
        "tick": snapshot.tick,
        "pending_actions": state.sync.pending_len(),
    }))
}
