//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use telemetry::health;

use crate::response::HealthResponse;
use crate::state::AppState;

/// Refreshes the session store component from the live store.
fn refresh_store_health(state: &AppState) {
    if state.gate.store().is_healthy() {
        health().session_store.set_healthy();
    } else {
        health().session_store.set_unhealthy("session store not responding");
    }
}

/// GET /health - Full health check.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    refresh_store_health(&state);
    let report = health().report();

    Json(HealthResponse {
        status: report.status.as_str().to_string(),
        session_store_healthy: health().session_store.is_healthy(),
        auth_config_valid: health().auth_config.is_healthy(),
    })
}

/// GET /health/ready - Readiness probe (can accept logins).
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    refresh_store_health(&state);
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
