// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bearer token claims and authentication failure kinds.
//!
//! The wire payload keeps the camelCase claim names of the MCP gateway
//! protocol (`userId`, `sessionId`); the struct is the canonical claim
//! set signed into every bearer token.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::principal::AuthContext;
use crate::domain::session::SessionId;

/// The claim set carried inside a bearer token.
///
/// Invariants: `exp > iat`; `iss` equals the issuing gateway's configured
/// issuer; `scope` elements are opaque labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "userId")]
    pub user_id: String,

    #[serde(rename = "sessionId")]
    pub session_id: String,

    pub scope: Vec<String>,

    /// Issued-at, seconds since Unix epoch.
    pub iat: i64,

    /// Expiry, seconds since Unix epoch.
    pub exp: i64,

    /// Issuer label of the gateway that minted the token.
    pub iss: String,
}

impl TokenClaims {
    /// Parse the `sessionId` claim into a typed [`SessionId`].
    ///
    /// A claim that is not a UUID can never name a live session, so the
    /// caller treats a parse failure as session-not-found.
    pub fn parsed_session_id(&self) -> Option<SessionId> {
        self.session_id.parse().ok()
    }

    /// Build the per-request principal from verified claims.
    pub fn to_auth_context(&self, session_id: SessionId) -> AuthContext {
        AuthContext::new(self.user_id.clone(), session_id, self.scope.iter().cloned())
    }
}

/// Token verification failure kinds, in the order the checks run:
/// syntactic decode, signature, issuer, expiry, payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is not a syntactically valid compact JWT.
    #[error("token is malformed")]
    Malformed,

    /// The signature does not verify against the gateway secret.
    #[error("token signature is invalid")]
    BadSignature,

    /// The `iss` claim does not match the configured issuer.
    #[error("token issuer mismatch")]
    WrongIssuer,

    /// `exp` is in the past (or absent, which is treated as expired).
    #[error("token has expired")]
    Expired,

    /// `userId`, `sessionId`, or `scope` is missing or empty.
    #[error("token payload is malformed")]
    PayloadShape,
}

impl AuthError {
    /// Stable machine-readable kind, used in audit metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed => "token_malformed",
            Self::BadSignature => "token_bad_signature",
            Self::WrongIssuer => "token_wrong_issuer",
            Self::Expired => "token_expired",
            Self::PayloadShape => "token_payload_shape",
        }
    }
}
