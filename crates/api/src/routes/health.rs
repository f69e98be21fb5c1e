//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub broker: &'static str,
}

/// GET /health: returns service health and whether events are published.
pub async fn check(State(publishing): State<bool>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        broker: if publishing { "enabled" } else { "disabled" },
    })
}
