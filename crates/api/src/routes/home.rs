//! Home page login prompt.

use axum::{
    extract::{Query, State},
    Json,
};
use directory_core::sanitize_return_url;
use serde::Deserialize;

use crate::extractors::GateRequest;
use crate::response::HomeResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub login: Option<String>,
    #[serde(rename = "return")]
    pub return_to: Option<String>,
}

/// GET / - Whether the home page should open the login dialog.
pub async fn home_handler(
    State(state): State<AppState>,
    GateRequest { ctx, .. }: GateRequest,
    Query(query): Query<HomeQuery>,
) -> Json<HomeResponse> {
    let show_login_modal = state.gate.take_login_prompt(&ctx).await;

    Json(HomeResponse {
        show_login_modal,
        login_required: query.login.as_deref() == Some("required"),
        return_url: query
            .return_to
            .as_deref()
            .and_then(sanitize_return_url)
            .map(str::to_string),
    })
}
