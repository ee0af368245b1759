// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The authenticated principal for a single request.
//!
//! An [`AuthContext`] is built from a verified bearer token after the
//! referenced session has been confirmed live. It is never stored; it
//! lives for the duration of one pipeline pass and is handed to
//! authorization rules, middlewares, and the tool handler.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::session::SessionId;

/// Default scopes granted when a session is created without an explicit
/// scope set.
pub const DEFAULT_SCOPES: &[&str] = &["read", "write"];

/// Identifies the authenticated caller of a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// Stable user identifier, as carried in the token's `userId` claim.
    pub user_id: String,

    /// The live session this request is bound to.
    pub session_id: SessionId,

    /// Opaque scope labels granted to the session.
    pub scope: HashSet<String>,
}

impl AuthContext {
    pub fn new(
        user_id: impl Into<String>,
        session_id: SessionId,
        scope: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id,
            scope: scope.into_iter().collect(),
        }
    }

    /// Whether the principal holds a single scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.contains(scope)
    }

    /// Whether the principal holds every scope in `required`.
    ///
    /// Vacuously true for an empty `required` set.
    pub fn has_all_scopes<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required.iter().all(|s| self.scope.contains(s.as_ref()))
    }

    /// Whether the principal holds at least one scope in `candidates`.
    ///
    /// False for an empty `candidates` set.
    pub fn has_any_scope<S: AsRef<str>>(&self, candidates: &[S]) -> bool {
        candidates.iter().any(|s| self.scope.contains(s.as_ref()))
    }
}

/// The default scope set as owned strings.
pub fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(scopes: &[&str]) -> AuthContext {
        AuthContext::new(
            "u1",
            SessionId::new(),
            scopes.iter().map(|s| s.to_string()),
        )
    }

    #[test]
    fn test_has_scope() {
        let ctx = ctx(&["read", "tasks:write"]);
        assert!(ctx.has_scope("read"));
        assert!(ctx.has_scope("tasks:write"));
        assert!(!ctx.has_scope("write"));
    }

    #[test]
    fn test_has_all_scopes_subset() {
        let ctx = ctx(&["read", "write", "admin"]);
        assert!(ctx.has_all_scopes(&["read", "write"]));
        assert!(!ctx.has_all_scopes(&["read", "tasks:delete"]));
    }

    #[test]
    fn test_empty_set_semantics() {
        let ctx = ctx(&["read"]);
        // HasAllScopes(∅) = true, HasAnyScope(∅) = false
        assert!(ctx.has_all_scopes::<&str>(&[]));
        assert!(!ctx.has_any_scope::<&str>(&[]));
    }

    #[test]
    fn test_has_any_scope() {
        let ctx = ctx(&["read"]);
        assert!(ctx.has_any_scope(&["write", "read"]));
        assert!(!ctx.has_any_scope(&["write", "admin"]));
    }
}
