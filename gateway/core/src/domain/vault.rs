// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Credential store seam.
//!
//! The domain only sees this trait; the concrete keyring-backed vault
//! lives in the infrastructure layer. Tool handlers receive the store
//! through their [`SecurityContext`](crate::domain::tool::SecurityContext)
//! and address secrets by free-form composite keys (the sample tools use
//! `"{userId}:{service}"`).

use async_trait::async_trait;
use thiserror::Error;

/// Storage failures surfaced by a credential store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// The OS keyring rejected the operation and memory fallback is
    /// disabled for this vault instance.
    #[error("keyring unavailable: {0}")]
    KeyringUnavailable(String),

    /// No secret is stored under the requested key.
    #[error("secret not found: {0}")]
    NotFound(String),
}

/// Key-addressed secret store.
///
/// The store never inspects secret bytes; callers own the key namespace.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store `secret` under `key`, overwriting any previous value.
    async fn store(&self, key: &str, secret: &str) -> Result<(), VaultError>;

    /// Fetch the secret under `key`, or `None` if absent.
    async fn retrieve(&self, key: &str) -> Result<Option<String>, VaultError>;

    /// Remove the secret under `key`. Returns whether one existed.
    async fn delete(&self, key: &str) -> Result<bool, VaultError>;

    /// Whether a secret is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool, VaultError> {
        Ok(self.retrieve(key).await?.is_some())
    }

    /// Fetch the secret under `key`, failing with
    /// [`VaultError::NotFound`] if absent.
    async fn retrieve_required(&self, key: &str) -> Result<String, VaultError> {
        self.retrieve(key)
            .await?
            .ok_or_else(|| VaultError::NotFound(key.to_string()))
    }
}
