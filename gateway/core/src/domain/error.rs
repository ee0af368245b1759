// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The gateway error taxonomy.
//!
//! Every failure the pipeline can produce is a distinguishable kind, not
//! a text string. All kinds are recoverable at the gateway boundary:
//! each becomes one audit entry plus a structured response error, and
//! nothing aborts the process.

use thiserror::Error;

use crate::domain::audit::AuditOutcome;
use crate::domain::authorization::AuthzDenial;
use crate::domain::mcp::MCPError;
use crate::domain::session::SessionError;
use crate::domain::token::AuthError;
use crate::domain::tool::ToolError;

/// A failed pipeline pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The request carried no bearer token.
    #[error("authentication required")]
    AuthRequired,

    /// Token verification failed; the sub-kind says how.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The token's session is gone or expired.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The authorization rule denied the call.
    #[error(transparent)]
    Authorization(#[from] AuthzDenial),

    /// No tool is registered under the requested name.
    #[error("tool not found: {tool_name}")]
    ToolNotFound { tool_name: String },

    /// The caller exhausted its fixed-window quota.
    #[error("rate limit exceeded, retry in {retry_after_ms}ms")]
    RateLimitExceeded { retry_after_ms: u64 },

    /// A middleware blocked the request.
    #[error("request blocked by middleware")]
    BlockedByMiddleware,

    /// The tool handler itself failed after the security checks passed.
    #[error("tool handler failed: {0}")]
    Handler(#[from] ToolError),
}

impl GatewayError {
    /// Stable machine-readable kind, carried in audit metadata and in the
    /// response error's `data.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::Auth(e) => e.kind(),
            Self::Session(e) => e.kind(),
            Self::Authorization(e) => e.kind(),
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::BlockedByMiddleware => "blocked_by_middleware",
            Self::Handler(_) => "handler_failed",
        }
    }

    /// How this failure is recorded in the audit trail: handler faults
    /// are `error`, everything the security layer rejected is `failure`.
    pub fn audit_outcome(&self) -> AuditOutcome {
        match self {
            Self::Handler(_) => AuditOutcome::Error,
            _ => AuditOutcome::Failure,
        }
    }

    /// Render as a JSON-RPC error object.
    ///
    /// Code mapping is this gateway's transport-facing table; the kind in
    /// `data.kind` is the normative discriminator. Messages never include
    /// token contents or secrets.
    pub fn to_mcp_error(&self) -> MCPError {
        let code = match self {
            Self::ToolNotFound { .. } => -32601,
            Self::AuthRequired | Self::Auth(_) => -32001,
            Self::Session(_) => -32002,
            Self::Authorization(_) => -32003,
            Self::RateLimitExceeded { .. } => -32004,
            Self::BlockedByMiddleware => -32005,
            Self::Handler(_) => -32603,
        };
        MCPError::new(code, self.to_string())
            .with_data(serde_json::json!({ "kind": self.kind() }))
    }
}
