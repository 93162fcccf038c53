//! Application state shared across handlers.

use directory_core::{AuthConfig, MemorySessionStore, SessionAuthGate, SessionStore};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Admin session gate
    pub gate: SessionAuthGate,
}

impl AppState {
    pub fn new(gate: SessionAuthGate) -> Self {
        Self { gate }
    }

    /// Builds a gate over an in-memory session store.
    ///
    /// Sessions idle for longer than both the cookie and session lifetimes
    /// are evicted.
    pub fn in_memory(config: AuthConfig) -> Self {
        let idle = config
            .cookie_lifetime()
            .max(Duration::from_secs(config.session_lifetime_secs));
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(idle));
        Self::new(SessionAuthGate::new(config, store))
    }
}
