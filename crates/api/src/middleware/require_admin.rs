//! Admin session guard.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use directory_core::{AnonymousReason, DenialResponse, GateDecision, SessionData};
use telemetry::metrics;
use tracing::warn;

use crate::extractors::GateRequest;
use crate::response::{append_cookies, apply_no_cache, NotLoggedInResponse};
use crate::state::AppState;

/// The authenticated admin session, inserted for guarded handlers.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionData);

/// Lets the request through only with a valid admin session.
///
/// Every response from a guarded route, granted or not, is marked
/// uncacheable.
pub async fn require_admin(
    State(state): State<AppState>,
    gate_request: GateRequest,
    mut request: Request,
    next: Next,
) -> Response {
    let GateRequest { ctx, is_ajax } = gate_request;

    let mut response = match state.gate.require_authenticated(&ctx, is_ajax).await {
        GateDecision::Granted(session) => {
            request.extensions_mut().insert(AdminSession(session));
            next.run(request).await
        }
        GateDecision::Denied(denial) => {
            metrics().guard_denials.inc();
            record_anonymous(denial.reason);

            let mut response = match denial.response {
                DenialResponse::Json { redirect } => {
                    (StatusCode::UNAUTHORIZED, Json(NotLoggedInResponse::new(redirect)))
                        .into_response()
                }
                DenialResponse::Redirect { location } => Redirect::to(&location).into_response(),
            };
            append_cookies(response.headers_mut(), &denial.cookies);
            response
        }
    };

    apply_no_cache(response.headers_mut());
    response
}

/// Counts sessions the gate threw away.
pub(crate) fn record_anonymous(reason: AnonymousReason) {
    match reason {
        AnonymousReason::Expired => metrics().sessions_expired.inc(),
        AnonymousReason::Hijacked => metrics().hijack_detected.inc(),
        AnonymousReason::StoreUnavailable => warn!("Admin request denied: session store unavailable"),
        AnonymousReason::NoSession | AnonymousReason::NotLoggedIn => {}
    }
}
