//! Server-side session types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hijack::generate_token;
use crate::limits::TOKEN_BYTES;

/// Opaque session identifier carried in the session cookie.
///
/// 256 random bits, hex-encoded.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Creates a fresh random identifier.
    pub fn generate() -> Self {
        Self(generate_token())
    }

    /// Parses a cookie value. Anything that is not a well-formed id is ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let well_formed = raw.len() == TOKEN_BYTES * 2
            && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Keep ids out of logs.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", self.0.get(..8).unwrap_or_default())
    }
}

/// Data stored server-side for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_logged_in: bool,
    pub username: String,
    /// Set at login and slid forward while the session stays active
    pub login_time: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    /// Recorded at login, not enforced
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Never sent to the client; only its auth-check derivation is
    pub auth_token: Option<String>,
    /// Flash flag telling the home page to open the login dialog
    pub show_login_modal: bool,
}

impl SessionData {
    /// Whether nothing has been stored in the session.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Session data for a freshly authenticated administrator.
    pub fn authenticated(
        username: impl Into<String>,
        now: DateTime<Utc>,
        ip_address: Option<String>,
        user_agent: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            user_logged_in: true,
            username: username.into(),
            login_time: Some(now),
            last_activity: Some(now),
            ip_address,
            user_agent: Some(user_agent.into()),
            auth_token: Some(auth_token.into()),
            show_login_modal: false,
        }
    }

    /// An anonymous session that only asks the home page to prompt for login.
    pub fn login_prompt() -> Self {
        Self {
            show_login_modal: true,
            ..Self::default()
        }
    }

    /// Whether both hijack-check inputs were recorded at login.
    pub fn has_binding(&self) -> bool {
        self.auth_token.is_some() && self.user_agent.is_some()
    }
}
