//! HTTP routes.

mod api;

pub use api::{DropFoodRequest, DropFoodResponse, StateResponse};

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/state", get(api::get_state))
        .route("/api/action/drop_food", post(api::drop_food))
        .route("/api/grid/heatmap", get(api::get_heatmap))
        .route("/api/grid/description", get(api::get_description))
        .route("/api/health", get(api::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
