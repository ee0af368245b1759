// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Gateway construction options.
//!
//! A missing signing secret is a construction-time error and fatal for
//! the embedding process; every runtime failure after that point is
//! recoverable at the gateway boundary.

use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::audit_logger::AuditConfig;
use crate::infrastructure::rate_limiter::RateLimitConfig;
use crate::infrastructure::token_vault::VaultConfig;

/// Configuration problems detected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("signing secret must not be empty")]
    MissingSigningSecret,

    #[error("gateway name must not be empty")]
    MissingName,
}

/// Everything a [`SecureGateway`](crate::application::gateway::SecureGateway)
/// is built from.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Gateway name; doubles as the `iss` claim on issued tokens.
    pub name: String,
    pub version: String,

    /// HMAC key for token sign and verify. Required.
    pub signing_secret: String,

    /// Session lifetime granted at `create_session`.
    pub session_expiry: Duration,

    /// Period of the session eviction sweep.
    pub cleanup_interval: Duration,

    /// Token lifetime, `exp - iat`, in seconds.
    pub token_expiry_secs: i64,

    /// Fixed-window quota applied per `userId`.
    pub rate_limit: RateLimitConfig,

    pub vault: VaultConfig,
    pub audit: AuditConfig,
}

impl GatewayConfig {
    /// A config with the documented defaults: 1 h sessions and tokens,
    /// 100 requests per 60 s window, keyring vault with memory fallback,
    /// 10 000-entry audit ring, no sink.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        signing_secret: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            signing_secret: signing_secret.into(),
            session_expiry: Duration::from_millis(3_600_000),
            cleanup_interval: Duration::from_millis(60_000),
            token_expiry_secs: 3_600,
            rate_limit: RateLimitConfig::default(),
            vault: VaultConfig::default(),
            audit: AuditConfig::default(),
        }
    }

    pub fn with_session_expiry(mut self, expiry: Duration) -> Self {
        self.session_expiry = expiry;
        self
    }

    pub fn with_token_expiry_secs(mut self, secs: i64) -> Self {
        self.token_expiry_secs = secs;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_vault(mut self, vault: VaultConfig) -> Self {
        self.vault = vault;
        self
    }

    pub fn with_audit(mut self, audit: AuditConfig) -> Self {
        self.audit = audit;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::MissingSigningSecret);
        }
        if self.name.is_empty() {
            return Err(ConfigError::MissingName);
        }
        Ok(())
    }
}

impl std::fmt::Debug for GatewayConfig {
    // the signing secret stays out of debug output
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("session_expiry", &self.session_expiry)
            .field("token_expiry_secs", &self.token_expiry_secs)
            .field("rate_limit", &self.rate_limit)
            .field("vault", &self.vault)
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documentation() {
        let config = GatewayConfig::new("gw", "0.1.0", "secret");
        assert_eq!(config.session_expiry, Duration::from_millis(3_600_000));
        assert_eq!(config.token_expiry_secs, 3_600);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.audit.max_entries, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_secret_is_fatal() {
        let config = GatewayConfig::new("gw", "0.1.0", "");
        assert_eq!(config.validate().unwrap_err(), ConfigError::MissingSigningSecret);
    }

    #[test]
    fn test_debug_never_prints_the_secret() {
        let config = GatewayConfig::new("gw", "0.1.0", "super-secret-value");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-value"));
    }
}
