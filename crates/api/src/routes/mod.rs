//! API routes.

pub mod admin;
pub mod auth;
pub mod health;
pub mod home;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::middleware::require_admin;
use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/admin/index.php", get(admin::index_handler))
        .route("/admin/api/whoami", get(admin::whoami_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/", get(home::home_handler))
        .route("/admin/login", post(auth::login_handler))
        .route("/admin/session", get(auth::session_check_handler))
        .route(
            "/admin/logout",
            get(auth::logout_handler).post(auth::logout_handler),
        )
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .merge(guarded)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
