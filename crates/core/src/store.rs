//! Session storage.
//!
//! The gate never touches process-global state; everything it knows about a
//! browser lives behind [`SessionStore`].

use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::session::{SessionData, SessionId};

/// Maximum concurrently stored sessions.
const MAX_SESSIONS: u64 = 100_000;

/// Server-side session storage keyed by session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session. Unknown ids yield `None`.
    async fn get(&self, id: &SessionId) -> Result<Option<SessionData>>;

    /// Stores or replaces a session.
    async fn set(&self, id: &SessionId, data: SessionData) -> Result<()>;

    /// Removes a session. Removing an unknown id is not an error.
    async fn destroy(&self, id: &SessionId) -> Result<()>;

    /// Moves a session's data to a new id and invalidates the old one.
    ///
    /// With no old id, or an unknown one, a fresh empty session is created.
    async fn regenerate_id(&self, old: Option<&SessionId>) -> Result<SessionId>;

    /// Whether the store can currently serve requests.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// In-process session store.
///
/// Entries idle for longer than the configured time-to-idle are evicted, so
/// sessions abandoned without logout do not accumulate.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<SessionId, SessionData>,
}

impl MemorySessionStore {
    pub fn new(time_to_idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(time_to_idle)
                .build(),
        }
    }

    /// Number of stored sessions (approximate until pending tasks run).
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<SessionData>> {
        Ok(self.sessions.get(id).await)
    }

    async fn set(&self, id: &SessionId, data: SessionData) -> Result<()> {
        self.sessions.insert(id.clone(), data).await;
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<()> {
        self.sessions.invalidate(id).await;
        Ok(())
    }

    async fn regenerate_id(&self, old: Option<&SessionId>) -> Result<SessionId> {
        let carried = match old {
            Some(old) => self.sessions.remove(old).await,
            None => None,
        };

        let new_id = SessionId::generate();
        self.sessions
            .insert(new_id.clone(), carried.unwrap_or_default())
            .await;

        debug!(carried_data = old.is_some(), "Regenerated session id");
        Ok(new_id)
    }
}
