//! HTTP surface of the engine
//!
//! Only the streaming boundary and a health probe live here; routing for
//! the wider product (auth, teams, exports) belongs to other services.

use axum::{response::Json, routing::get, Router};
use serde_json::json;

use crate::sse;
use crate::state::AppState;

/// Create the service router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sessions/:session_id/events", get(sse::session_events))
        .with_state(state)
}

/// GET /health - liveness probe
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "crs-engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
