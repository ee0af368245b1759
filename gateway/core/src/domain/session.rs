// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Session domain types.
//!
//! A session is the server-side record of an authenticated principal. A
//! bearer token is only honoured while the session named by its
//! `sessionId` claim is live; destroying the session invalidates every
//! token minted against it.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique session identifier (UUIDv4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Why a session lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error("session has expired")]
    Expired,
}

impl SessionError {
    /// Stable machine-readable kind, used in audit metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "session_not_found",
            Self::Expired => "session_expired",
        }
    }
}

/// A live session record.
///
/// Invariants: `expires_at > created_at` at creation; once
/// `now > expires_at` the session must be treated as absent everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Caller-supplied opaque metadata, carried but never interpreted.
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Session {
    pub fn new(
        user_id: impl Into<String>,
        ttl: Duration,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            user_id: user_id.into(),
            created_at: now,
            expires_at: now + ttl,
            metadata,
        }
    }

    /// Whether the session has outlived its expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Push `expires_at` out by `delta`.
    pub fn extend(&mut self, delta: Duration) {
        self.expires_at += delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_live() {
        let session = Session::new("u1", Duration::milliseconds(60_000), None);
        assert!(!session.is_expired());
        assert!(session.expires_at > session.created_at);
    }

    #[test]
    fn test_extend_pushes_expiry() {
        let mut session = Session::new("u1", Duration::milliseconds(1_000), None);
        let before = session.expires_at;
        session.extend(Duration::milliseconds(5_000));
        assert_eq!(session.expires_at - before, Duration::milliseconds(5_000));
    }

    #[test]
    fn test_session_id_roundtrip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_session_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }
}
