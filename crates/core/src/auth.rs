//! Admin login request types.
//!
//! This module provides:
//! - The login request body and its validation
//! - Return-URL sanitising for post-login redirects

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::{AuthErrorCode, Error, Result, ValidationErrorCode};
use crate::limits::{
    MAX_LOGIN_BODY_BYTES, MAX_PASSWORD_LENGTH, MAX_RETURN_URL_LENGTH, MAX_USERNAME_LENGTH,
};

/// Body of `POST /admin/login`.
#[derive(Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_username_length"))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "validate_password_length"))]
    pub password: String,
    #[serde(default)]
    pub return_url: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("return_url", &self.return_url)
            .finish()
    }
}

impl LoginRequest {
    /// Parses and validates a raw JSON body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.len() > MAX_LOGIN_BODY_BYTES {
            return Err(Error::validation_code(
                ValidationErrorCode::InvalidFormat,
                "Request body too large",
            ));
        }

        let request: Self = serde_json::from_slice(body).map_err(|_| {
            Error::validation_code(ValidationErrorCode::InvalidFormat, "Invalid request")
        })?;

        // Whitespace-only counts as missing. The value itself is kept as sent.
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(Error::auth(
                AuthErrorCode::MissingCredentials,
                "Username and password are required",
            ));
        }

        request.validate().map_err(|_| {
            Error::validation_code(ValidationErrorCode::InvalidFormat, "Invalid request")
        })?;

        Ok(request)
    }

    /// The post-login destination, falling back to `default` for unsafe values.
    pub fn resolved_return_url(&self, default: &str) -> String {
        self.return_url
            .as_deref()
            .and_then(sanitize_return_url)
            .unwrap_or(default)
            .to_string()
    }
}

/// Username limit, counted in characters.
fn validate_username_length(username: &str) -> std::result::Result<(), ValidationError> {
    if username.chars().count() > MAX_USERNAME_LENGTH {
        let mut err = ValidationError::new("username_too_long");
        err.message = Some(format!("username exceeds {} characters", MAX_USERNAME_LENGTH).into());
        return Err(err);
    }
    Ok(())
}

/// Password limit, counted in bytes since that is what the KDF hashes.
fn validate_password_length(password: &str) -> std::result::Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_LENGTH {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some(format!("password exceeds {} bytes", MAX_PASSWORD_LENGTH).into());
        return Err(err);
    }
    Ok(())
}

/// Accepts only same-origin absolute paths.
///
/// Rejects scheme-relative (`//host`) and backslash (`/\host`) forms that
/// browsers treat as external, plus anything with control characters.
pub fn sanitize_return_url(url: &str) -> Option<&str> {
    let url = url.trim();
    if url.is_empty() || url.len() > MAX_RETURN_URL_LENGTH {
        return None;
    }
    if !url.starts_with('/') || url.starts_with("//") || url.starts_with("/\\") {
        return None;
    }
    if url.chars().any(|c| c.is_control()) {
        return None;
    }
    Some(url)
}
