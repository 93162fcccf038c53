//! Admin authentication configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::cookie::SameSite;
use crate::credentials;
use crate::error::{Error, Result};

/// Settings for the admin session gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// The single administrator account name
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// PHC-format PBKDF2 hash of the admin password
    #[serde(default)]
    pub admin_password_hash: String,
    /// Maximum age of `login_time` before the session is expired
    #[serde(default = "default_session_lifetime_secs")]
    pub session_lifetime_secs: u64,
    /// Age of `login_time` after which a valid check slides it forward
    #[serde(default = "default_session_update_interval_secs")]
    pub session_update_interval_secs: u64,
    /// Max-Age of the session and auth-check cookies
    #[serde(default = "default_cookie_lifetime_secs")]
    pub cookie_lifetime_secs: u64,
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    /// Force the Secure flag on or off. Derived from the request when unset.
    #[serde(default)]
    pub cookie_secure: Option<bool>,
    #[serde(default)]
    pub cookie_same_site: SameSite,
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,
    #[serde(default = "default_auth_check_cookie_name")]
    pub auth_check_cookie_name: String,
    /// Public home route used for login redirects
    #[serde(default = "default_home_path")]
    pub home_path: String,
    /// Where a successful login lands when no return URL was supplied
    #[serde(default = "default_return_url")]
    pub default_return_url: String,
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_session_lifetime_secs() -> u64 {
    3600
}

fn default_session_update_interval_secs() -> u64 {
    300
}

fn default_cookie_lifetime_secs() -> u64 {
    3600
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_session_cookie_name() -> String {
    "staffdir_session".to_string()
}

fn default_auth_check_cookie_name() -> String {
    "staffdir_auth_check".to_string()
}

fn default_home_path() -> String {
    "/".to_string()
}

fn default_return_url() -> String {
    "/admin/index.php".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password_hash: String::new(),
            session_lifetime_secs: default_session_lifetime_secs(),
            session_update_interval_secs: default_session_update_interval_secs(),
            cookie_lifetime_secs: default_cookie_lifetime_secs(),
            cookie_path: default_cookie_path(),
            cookie_domain: None,
            cookie_secure: None,
            cookie_same_site: SameSite::default(),
            session_cookie_name: default_session_cookie_name(),
            auth_check_cookie_name: default_auth_check_cookie_name(),
            home_path: default_home_path(),
            default_return_url: default_return_url(),
        }
    }
}

impl AuthConfig {
    pub fn session_lifetime(&self) -> Duration {
        Duration::seconds(secs_to_i64(self.session_lifetime_secs))
    }

    pub fn session_update_interval(&self) -> Duration {
        Duration::seconds(secs_to_i64(self.session_update_interval_secs))
    }

    pub fn cookie_lifetime(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cookie_lifetime_secs)
    }

    /// Resolves the Secure cookie flag for a request.
    pub fn secure_cookies(&self, request_is_https: bool) -> bool {
        self.cookie_secure.unwrap_or(request_is_https)
    }

    /// Checks the configuration for values the gate cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.admin_username.trim().is_empty() {
            return Err(Error::config("admin_username must not be empty"));
        }
        if self.admin_password_hash.is_empty() {
            return Err(Error::config(
                "admin_password_hash is not set (generate one with `hash-password`)",
            ));
        }
        credentials::parse_password_hash(&self.admin_password_hash)?;

        if self.session_lifetime_secs == 0 {
            return Err(Error::config("session_lifetime_secs must be positive"));
        }
        if self.session_update_interval_secs >= self.session_lifetime_secs {
            return Err(Error::config(
                "session_update_interval_secs must be shorter than session_lifetime_secs",
            ));
        }
        if self.session_cookie_name.is_empty() || self.auth_check_cookie_name.is_empty() {
            return Err(Error::config("cookie names must not be empty"));
        }
        if self.session_cookie_name == self.auth_check_cookie_name {
            return Err(Error::config(
                "session_cookie_name and auth_check_cookie_name must differ",
            ));
        }
        if !self.cookie_path.starts_with('/') {
            return Err(Error::config("cookie_path must start with '/'"));
        }
        Ok(())
    }
}

fn secs_to_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX / 1000)
}
