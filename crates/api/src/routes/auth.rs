//! Login, session-check and logout endpoints.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use directory_core::{AuthState, LoginRequest};
use telemetry::metrics;
use tracing::{error, warn};

use crate::extractors::GateRequest;
use crate::middleware::require_admin::record_anonymous;
use crate::response::{
    append_cookies, apply_no_cache, LoginRejection, LoginSuccess, SessionCheckResponse,
};
use crate::state::AppState;

/// POST /admin/login - Verify credentials and open an admin session.
pub async fn login_handler(
    State(state): State<AppState>,
    gate_request: GateRequest,
    body: Bytes,
) -> Result<Response, LoginRejection> {
    let start = Instant::now();
    metrics().login_attempts.inc();

    let result = login(&state, gate_request, &body).await;
    metrics()
        .login_latency_ms
        .observe(start.elapsed().as_millis() as u64);
    result
}

async fn login(
    state: &AppState,
    GateRequest { ctx, .. }: GateRequest,
    body: &[u8],
) -> Result<Response, LoginRejection> {
    let request = LoginRequest::parse(body).map_err(|e| {
        metrics().login_failures.inc();
        LoginRejection::from(e)
    })?;

    // Password hashing is CPU-bound.
    let gate = state.gate.clone();
    let username = request.username.clone();
    let password = request.password.clone();
    let valid = tokio::task::spawn_blocking(move || gate.verify_credentials(&username, &password))
        .await
        .map_err(|e| {
            error!(error = %e, "Credential check task failed");
            metrics().login_errors.inc();
            LoginRejection::internal()
        })?;

    if !valid {
        warn!(username = %request.username, ip = ?ctx.ip_address, "Failed admin login");
        metrics().login_failures.inc();
        return Err(LoginRejection::invalid_credentials());
    }

    let grant = state.gate.login(&ctx, &request.username).await.map_err(|e| {
        error!(error = %e, "Could not establish admin session");
        metrics().login_errors.inc();
        LoginRejection::internal()
    })?;

    metrics().login_successes.inc();

    let return_url = request.resolved_return_url(&state.gate.config().default_return_url);
    let mut response = Json(LoginSuccess::new(return_url)).into_response();
    append_cookies(response.headers_mut(), &grant.cookies);
    apply_no_cache(response.headers_mut());
    Ok(response)
}

/// GET /admin/session - Report whether the caller holds an admin session.
pub async fn session_check_handler(
    State(state): State<AppState>,
    GateRequest { ctx, .. }: GateRequest,
) -> Response {
    let auth = state.gate.is_authenticated(&ctx).await;

    let body = SessionCheckResponse {
        logged_in: auth.is_authenticated(),
        timestamp: state.gate.clock().now().timestamp(),
    };
    let mut response = Json(body).into_response();

    if let AuthState::Anonymous(reason) = auth {
        record_anonymous(reason);
        if reason.destroyed_session() {
            append_cookies(response.headers_mut(), &state.gate.clear_cookies(&ctx));
        }
    }

    apply_no_cache(response.headers_mut());
    response
}

/// GET|POST /admin/logout - End the admin session and go home.
pub async fn logout_handler(
    State(state): State<AppState>,
    GateRequest { ctx, .. }: GateRequest,
) -> Response {
    let cookies = state.gate.logout(&ctx).await;
    metrics().logouts.inc();

    let location = format!("{}?logged_out=1", state.gate.config().home_path);
    let mut response = Redirect::to(&location).into_response();
    append_cookies(response.headers_mut(), &cookies);
    apply_no_cache(response.headers_mut());
    response
}
