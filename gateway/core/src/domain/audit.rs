// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Audit entry shape and the fixed action vocabulary used by the core.
//!
//! Entries are totally ordered by insertion into the logger's ring; the
//! embedded `timestamp` is the only cross-request ordering signal audit
//! consumers may rely on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed `action` values emitted by the core. Embedders may log free-form
/// actions; these are the ones the gateway itself produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    TokenIssued,
    TokenVerified,
    TokenInvalid,
    TokenExpired,
    SessionCreated,
    SessionVerified,
    SessionExpired,
    SessionDestroyed,
    RateLimitExceeded,
    AuthorizationSucceeded,
    AuthorizationFailed,
    ToolCall,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenIssued => "token_issued",
            Self::TokenVerified => "token_verified",
            Self::TokenInvalid => "token_invalid",
            Self::TokenExpired => "token_expired",
            Self::SessionCreated => "session_created",
            Self::SessionVerified => "session_verified",
            Self::SessionExpired => "session_expired",
            Self::SessionDestroyed => "session_destroyed",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::AuthorizationSucceeded => "authorization_succeeded",
            Self::AuthorizationFailed => "authorization_failed",
            Self::ToolCall => "tool_call",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        action.as_str().to_string()
    }
}

/// How the audited operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The operation completed as requested.
    Success,
    /// The security layer rejected the operation.
    Failure,
    /// The operation was admitted but its handler failed.
    Error,
}

/// One structured security event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub result: AuditOutcome,

    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl AuditEntry {
    /// New entry stamped with the current instant.
    pub fn new(action: impl Into<String>, result: AuditOutcome) -> Self {
        Self {
            timestamp: Utc::now(),
            action: action.into(),
            result,
            user_id: None,
            session_id: None,
            resource: None,
            metadata: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl ToString) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a single metadata field, creating the map if needed.
    pub fn with_meta_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    pub fn is_success(&self) -> bool {
        self.result == AuditOutcome::Success
    }
}
