//! Common test setup functions.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use api::{router, state::AppState};
use axum::http::header;
use axum::Router;
use axum_test::{TestRequest, TestResponse, TestServer};
use chrono::Duration;
use directory_core::{
    credentials, AuthConfig, Clock, ManualClock, MemorySessionStore, SessionAuthGate, SessionStore,
};
use telemetry::health;

use crate::fixtures::{self, ADMIN_PASSWORD, ADMIN_USERNAME, TEST_HASH_ROUNDS};

/// Test context with the real router over a controllable clock.
///
/// This runs the same production code paths by:
/// - Using the real Axum router with the admin guard middleware
/// - Driving expiry through `ManualClock` instead of sleeping
/// - Swapping the session store when a test needs failures
pub struct TestContext {
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn SessionStore>,
    pub config: AuthConfig,
    pub router: Router,
}

impl TestContext {
    /// Create a context with default settings and an in-memory store.
    pub fn new() -> Self {
        Self::with_config(AuthConfig::default())
    }

    /// Create a context with custom settings. The admin password is always
    /// `fixtures::ADMIN_PASSWORD`.
    pub fn with_config(config: AuthConfig) -> Self {
        let store = Arc::new(MemorySessionStore::new(StdDuration::from_secs(
            config.session_lifetime_secs,
        )));
        Self::build(config, store)
    }

    /// Create a context over the given session store.
    pub fn with_store(store: Arc<dyn SessionStore>) -> Self {
        Self::build(AuthConfig::default(), store)
    }

    fn build(config: AuthConfig, store: Arc<dyn SessionStore>) -> Self {
        let config = AuthConfig {
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password_hash: credentials::hash_password_with_rounds(
                ADMIN_PASSWORD,
                TEST_HASH_ROUNDS,
            )
            .expect("Failed to hash test password"),
            ..config
        };
        config.validate().expect("Test config should be valid");
        health().auth_config.set_healthy();

        let clock = Arc::new(ManualClock::default());
        let gate = SessionAuthGate::with_clock(config.clone(), store.clone(), clock.clone());
        let router = router(AppState::new(gate));

        Self {
            clock,
            store,
            config,
            router,
        }
    }

    /// Start an in-process test server.
    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// The gate's current time as unix seconds.
    pub fn clock_now_secs(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// Move the gate's clock forward.
    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance(Duration::seconds(secs));
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A minimal browser: a user-agent plus a cookie jar fed from responses.
#[derive(Debug, Clone)]
pub struct Browser {
    pub user_agent: String,
    cookies: BTreeMap<String, String>,
}

impl Browser {
    pub fn new(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            cookies: BTreeMap::new(),
        }
    }

    /// Same cookies, different user-agent.
    pub fn with_user_agent(&self, user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            cookies: self.cookies.clone(),
        }
    }

    pub fn get(&self, server: &TestServer, path: &str) -> TestRequest {
        self.decorate(server.get(path))
    }

    pub fn post(&self, server: &TestServer, path: &str) -> TestRequest {
        self.decorate(server.post(path))
    }

    /// Log in as the admin and keep the issued cookies.
    pub async fn login(&mut self, server: &TestServer) -> TestResponse {
        let response = self
            .post(server, "/admin/login")
            .json(&fixtures::admin_login())
            .await;
        self.absorb(&response);
        response
    }

    /// Apply every `Set-Cookie` header in the response to the jar.
    pub fn absorb(&mut self, response: &TestResponse) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else {
                continue;
            };
            let pair = value.split(';').next().unwrap_or_default();
            let Some((name, cookie_value)) = pair.split_once('=') else {
                continue;
            };
            if value.contains("Max-Age=0") {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), cookie_value.trim().to_string());
            }
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn remove_cookie(&mut self, name: &str) {
        self.cookies.remove(name);
    }

    fn decorate(&self, request: TestRequest) -> TestRequest {
        let request = request.add_header("user-agent", self.user_agent.as_str());
        if self.cookies.is_empty() {
            return request;
        }
        let cookie_header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        request.add_header("cookie", cookie_header.as_str())
    }
}

/// All `Set-Cookie` header values of a response.
pub fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}
