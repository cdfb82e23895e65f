//! Axum router wiring.
//!
//! - `/` and `/ws`: WebSocket upgrade (`/` also serves a banner to plain GETs)
//! - `/health`: status for the hosting platform
//! - `/api/token`, `/api/translate`: only when the upstream is configured

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let proxy = state.proxy().router();

    Router::new()
        .route("/", get(ops::root))
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/health", get(ops::health))
        .with_state(state)
        .merge(proxy)
}
