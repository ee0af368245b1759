// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # aegis-gateway-core
//!
//! The security layer for the AEGIS MCP gateway. Every tool call that
//! crosses the gateway is authenticated, session-checked, rate-limited,
//! authorized, and audited before the tool handler runs.
//!
//! ## Components
//!
//! | Component | Module | Role |
//! |---|---|---|
//! | TokenVault | [`infrastructure::token_vault`] | Secret-at-rest store, OS keyring with memory fallback |
//! | AuditLogger | [`infrastructure::audit_logger`] | Bounded in-memory ring + best-effort sink fan-out |
//! | RateLimiter | [`infrastructure::rate_limiter`] | Fixed-window per-principal quota |
//! | Authenticator | [`infrastructure::authenticator`] | HS256 bearer token issue/verify |
//! | SessionManager | [`infrastructure::session_manager`] | Live session table with lazy + periodic eviction |
//! | RequestVerifier | [`infrastructure::request_verifier`] | Default-deny per-resource authorization rules |
//! | SecureGateway | [`application::gateway`] | The pipeline assembling all of the above |
//!
//! ## Layer Structure
//!
//! ```text
//! presentation/   ← stdio JSON-RPC transport glue
//!     ↓
//! application/    ← SecureGateway pipeline, middleware chain, config
//!     ↓
//! domain/         ← Principals, sessions, tokens, rules, audit entries
//!     ↓
//! infrastructure/ ← Keyring vault, token codec, session table, limiter
//! ```
//!
//! ## Integration Tests
//!
//! See `gateway/core/tests/` for the end-to-end pipeline scenarios
//! (happy path, expired token, missing scope, rate limiting, middleware
//! transforms and blocks).

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::gateway::{SecureGateway, SessionGrant};
pub use application::config::GatewayConfig;
pub use domain::error::GatewayError;
