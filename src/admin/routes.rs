//! HTTP route definitions

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::admin::handler::admin_ws_handler;
use crate::app::AppState;
use crate::util::time::uptime_secs;

/// Build the admin bridge router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ws/admin", get(admin_ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    action_players: usize,
    movement_players: usize,
    recent_escalations: usize,
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let tracked = state.anticheat.tracked_players();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        action_players: tracked.actions,
        movement_players: tracked.movement,
        recent_escalations: state.escalations.recent().len(),
    })
}
