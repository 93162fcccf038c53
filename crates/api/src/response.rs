//! Standardized API responses.

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use directory_core::{SessionData, SetCookie};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Generic message for any failure while establishing a session.
pub const LOGIN_ERROR_MESSAGE: &str = "An error occurred during login. Please try again.";

/// Message for wrong username or password. Never says which.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// Successful login.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSuccess {
    pub success: bool,
    pub return_url: String,
}

impl LoginSuccess {
    pub fn new(return_url: impl Into<String>) -> Self {
        Self {
            success: true,
            return_url: return_url.into(),
        }
    }
}

/// Failed login body: `{success:false, message}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginFailure {
    pub success: bool,
    pub message: String,
}

/// A login attempt turned away, with its status code.
pub struct LoginRejection {
    pub status: StatusCode,
    pub message: String,
}

impl LoginRejection {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_credentials() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_MESSAGE)
    }

    /// Hides internal detail behind the generic login error.
    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, LOGIN_ERROR_MESSAGE)
    }
}

impl From<directory_core::Error> for LoginRejection {
    fn from(err: directory_core::Error) -> Self {
        match &err {
            directory_core::Error::Auth { message, http_status, .. }
            | directory_core::Error::ValidationWithCode { message, http_status, .. }
                if *http_status < 500 =>
            {
                let status = StatusCode::from_u16(*http_status).unwrap_or(StatusCode::BAD_REQUEST);
                Self::new(status, message.clone())
            }
            _ => Self::internal(),
        }
    }
}

impl IntoResponse for LoginRejection {
    fn into_response(self) -> Response {
        let body = LoginFailure {
            success: false,
            message: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        apply_no_cache(response.headers_mut());
        response
    }
}

/// Session-check body.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCheckResponse {
    pub logged_in: bool,
    /// Unix seconds
    pub timestamp: i64,
}

/// JSON answer to an AJAX request on an admin route without a session.
#[derive(Debug, Serialize, Deserialize)]
pub struct NotLoggedInResponse {
    pub success: bool,
    pub logged_in: bool,
    pub redirect: String,
}

impl NotLoggedInResponse {
    pub fn new(redirect: impl Into<String>) -> Self {
        Self {
            success: false,
            logged_in: false,
            redirect: redirect.into(),
        }
    }
}

/// Home route login-prompt state.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub show_login_modal: bool,
    pub login_required: bool,
    pub return_url: Option<String>,
}

/// Who is logged in, for guarded admin routes.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub success: bool,
    pub username: String,
    pub login_time: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl From<&SessionData> for AdminSummary {
    fn from(session: &SessionData) -> Self {
        Self {
            success: true,
            username: session.username.clone(),
            login_time: session.login_time,
            last_activity: session.last_activity,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_store_healthy: bool,
    pub auth_config_valid: bool,
}

/// Appends `Set-Cookie` headers.
pub fn append_cookies(headers: &mut HeaderMap, cookies: &[SetCookie]) {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.header_value()) {
            Ok(value) => {
                headers.append(header::SET_COOKIE, value);
            }
            Err(e) => warn!(cookie = %cookie.name, error = %e, "Dropping unencodable cookie"),
        }
    }
}

/// Forbids caching of admin responses.
pub fn apply_no_cache(headers: &mut HeaderMap) {
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, max-age=0"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
}
