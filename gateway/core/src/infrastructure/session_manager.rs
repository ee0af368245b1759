// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Source of truth for live sessions.
//!
//! Expired sessions are evicted lazily on every access; the periodic
//! sweep only bounds the table's memory between accesses. An expired
//! session is deleted the moment it is observed, so the first caller
//! after expiry sees `Expired` and every later caller sees `NotFound`;
//! both mean "absent" to the pipeline.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::session::{Session, SessionError, SessionId};

/// Session manager construction options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime granted at creation.
    pub session_expiry: Duration,

    /// Period of the background eviction sweep.
    pub cleanup_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_expiry: Duration::from_millis(3_600_000),
            cleanup_interval: Duration::from_millis(60_000),
        }
    }
}

/// Create, look up, extend, and destroy sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Session>>,
    session_ttl: chrono::Duration,
    cleanup_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            session_ttl: chrono::Duration::milliseconds(config.session_expiry.as_millis() as i64),
            cleanup_interval: config.cleanup_interval,
            sweeper: Mutex::new(None),
        }
    }

    /// Create a session for `user_id` with a fresh UUIDv4 id.
    pub async fn create_session(
        &self,
        user_id: &str,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Session {
        let session = Session::new(user_id, self.session_ttl, metadata);
        self.sessions
            .write()
            .await
            .insert(session.session_id, session.clone());
        session
    }

    /// Look up a session, evicting it if it has expired.
    pub async fn verify_session(&self, session_id: &SessionId) -> Result<Session, SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get(session_id).ok_or(SessionError::NotFound)?;
        if session.is_expired() {
            sessions.remove(session_id);
            return Err(SessionError::Expired);
        }
        Ok(session.clone())
    }

    /// Thin accessor over [`verify_session`](Self::verify_session).
    pub async fn get_session(&self, session_id: &SessionId) -> Option<Session> {
        self.verify_session(session_id).await.ok()
    }

    /// All live sessions for `user_id`. Evicts expired rows it walks
    /// over, whoever they belong to.
    pub async fn get_user_sessions(&self, user_id: &str) -> Vec<Session> {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired());
        sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Push the session's expiry out by `delta` (the configured session
    /// lifetime when `None`). Returns false for unknown or expired ids.
    pub async fn extend_session(&self, session_id: &SessionId, delta: Option<Duration>) -> bool {
        let delta = delta
            .map(|d| chrono::Duration::milliseconds(d.as_millis() as i64))
            .unwrap_or(self.session_ttl);

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session_id) {
            Some(session) if session.is_expired() => {
                sessions.remove(session_id);
                false
            }
            Some(session) => {
                session.extend(delta);
                true
            }
            None => false,
        }
    }

    /// Remove a session. Idempotent in effect: the second call for the
    /// same id returns false.
    pub async fn destroy_session(&self, session_id: &SessionId) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Remove every session belonging to `user_id`; returns how many.
    pub async fn destroy_user_sessions(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }

    /// Evict every expired session; returns how many went.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        before - sessions.len()
    }

    /// Number of live sessions.
    pub async fn active_session_count(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired());
        sessions.len()
    }

    /// Drop the whole table.
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Start the periodic eviction sweep.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let interval = self.cleanup_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(manager) = weak.upgrade() else { break };
                let evicted = manager.cleanup_expired().await;
                if evicted > 0 {
                    debug!(evicted, "session sweep evicted expired sessions");
                }
            }
        });

        let mut sweeper = self.sweeper.lock();
        if let Some(old) = sweeper.replace(handle) {
            old.abort();
        }
    }

    /// Stop the sweeper. Access-time eviction keeps lookups correct.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.destroy();
    }
}
