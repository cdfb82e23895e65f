//! Operational HTTP endpoints.
//!
//! - `/health` : liveness plus current room count
//! - `/`       : banner, or WebSocket upgrade when the request asks for one

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::app_state::AppState;
use crate::transport;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: &'static str,
    /// Rooms with at least one member.
    pub rooms: usize,
}

pub fn health_check(rooms: usize) -> HealthResponse {
    HealthResponse { status: "ok", rooms }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health_check(state.engine().room_count()))
}

pub async fn root(State(state): State<AppState>, ws: Option<WebSocketUpgrade>) -> Response {
    match ws {
        Some(ws) => transport::ws::upgrade(state, ws),
        None => "pairline signaling relay is running".into_response(),
    }
}
