// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Secret-at-rest credential vault.
//!
//! Two backends: the OS keyring (primary) and an in-process map
//! (fallback). The state machine is `{Keyring, Memory}` with a single
//! one-way transition: the first keyring error demotes the instance to
//! memory mode for the rest of its lifetime, and a later keyring
//! recovery never switches it back. Repeated per-call probing of a
//! broken keyring would make Store/Retrieve non-idempotent across calls.
//!
//! Keyring operations run on the blocking pool; they are the vault's
//! only suspension points.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::vault::{CredentialStore, VaultError};

/// Synchronous keyring access, behind a trait so tests can stand in a
/// failing or scripted backend without touching the real OS keyring.
pub trait KeyringBackend: Send + Sync {
    fn set(&self, service: &str, key: &str, secret: &str) -> Result<(), String>;

    /// `Ok(None)` means no entry; `Err` means the keyring itself failed.
    fn get(&self, service: &str, key: &str) -> Result<Option<String>, String>;

    /// Returns whether an entry existed.
    fn delete(&self, service: &str, key: &str) -> Result<bool, String>;
}

/// The real OS keyring, via the `keyring` crate.
pub struct OsKeyring;

impl KeyringBackend for OsKeyring {
    fn set(&self, service: &str, key: &str, secret: &str) -> Result<(), String> {
        let entry = keyring::Entry::new(service, key).map_err(|e| e.to_string())?;
        entry.set_password(secret).map_err(|e| e.to_string())
    }

    fn get(&self, service: &str, key: &str) -> Result<Option<String>, String> {
        let entry = keyring::Entry::new(service, key).map_err(|e| e.to_string())?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.to_string()),
        }
    }

    fn delete(&self, service: &str, key: &str) -> Result<bool, String> {
        let entry = keyring::Entry::new(service, key).map_err(|e| e.to_string())?;
        match entry.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Vault construction options.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Keyring service label under which entries are filed.
    pub service_name: String,

    /// When false, keyring failures propagate as
    /// [`VaultError::KeyringUnavailable`] instead of demoting the vault.
    pub fallback_to_memory: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            service_name: "aegis-gateway".to_string(),
            fallback_to_memory: true,
        }
    }
}

/// Key-addressed secret store with keyring primary and memory fallback.
pub struct TokenVault {
    service_name: String,
    fallback_to_memory: bool,
    backend: Arc<dyn KeyringBackend>,
    using_keyring: AtomicBool,
    memory: Mutex<HashMap<String, String>>,
}

impl TokenVault {
    pub fn new(config: VaultConfig) -> Self {
        Self::with_backend(config, Arc::new(OsKeyring))
    }

    /// Construct over an explicit backend (tests inject doubles here).
    pub fn with_backend(config: VaultConfig, backend: Arc<dyn KeyringBackend>) -> Self {
        Self {
            service_name: config.service_name,
            fallback_to_memory: config.fallback_to_memory,
            backend,
            using_keyring: AtomicBool::new(true),
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the instance is still in keyring mode.
    pub fn is_using_keyring(&self) -> bool {
        self.using_keyring.load(Ordering::SeqCst)
    }

    /// Number of entries held in the memory map.
    pub fn memory_store_size(&self) -> usize {
        self.memory.lock().len()
    }

    /// Keys of the memory-mode entries. Keyrings are opaque, so this is
    /// a lower bound on what the vault holds.
    pub fn list_keys(&self) -> Vec<String> {
        self.memory.lock().keys().cloned().collect()
    }

    /// Drop every memory-mode entry. Keyring entries are untouched.
    pub fn clear_memory(&self) {
        self.memory.lock().clear();
    }

    /// Record the first keyring failure and flip to memory mode.
    fn demote(&self, op: &str, err: &str) {
        if self.using_keyring.swap(false, Ordering::SeqCst) {
            warn!(
                service = %self.service_name,
                operation = op,
                error = err,
                "keyring unavailable, vault demoted to in-memory storage"
            );
        }
    }

    async fn keyring_set(&self, key: &str, secret: &str) -> Result<(), String> {
        let backend = Arc::clone(&self.backend);
        let (service, key, secret) =
            (self.service_name.clone(), key.to_string(), secret.to_string());
        tokio::task::spawn_blocking(move || backend.set(&service, &key, &secret))
            .await
            .map_err(|e| e.to_string())?
    }

    async fn keyring_get(&self, key: &str) -> Result<Option<String>, String> {
        let backend = Arc::clone(&self.backend);
        let (service, key) = (self.service_name.clone(), key.to_string());
        tokio::task::spawn_blocking(move || backend.get(&service, &key))
            .await
            .map_err(|e| e.to_string())?
    }

    async fn keyring_delete(&self, key: &str) -> Result<bool, String> {
        let backend = Arc::clone(&self.backend);
        let (service, key) = (self.service_name.clone(), key.to_string());
        tokio::task::spawn_blocking(move || backend.delete(&service, &key))
            .await
            .map_err(|e| e.to_string())?
    }
}

#[async_trait]
impl CredentialStore for TokenVault {
    async fn store(&self, key: &str, secret: &str) -> Result<(), VaultError> {
        if self.is_using_keyring() {
            match self.keyring_set(key, secret).await {
                Ok(()) => {
                    debug!(key, "secret stored in keyring");
                    return Ok(());
                }
                Err(e) if self.fallback_to_memory => self.demote("store", &e),
                Err(e) => return Err(VaultError::KeyringUnavailable(e)),
            }
        }
        self.memory.lock().insert(key.to_string(), secret.to_string());
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<String>, VaultError> {
        if self.is_using_keyring() {
            match self.keyring_get(key).await {
                Ok(found) => return Ok(found),
                Err(e) if self.fallback_to_memory => self.demote("retrieve", &e),
                Err(e) => return Err(VaultError::KeyringUnavailable(e)),
            }
        }
        Ok(self.memory.lock().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, VaultError> {
        if self.is_using_keyring() {
            match self.keyring_delete(key).await {
                Ok(removed) => return Ok(removed),
                Err(e) if self.fallback_to_memory => self.demote("delete", &e),
                Err(e) => return Err(VaultError::KeyringUnavailable(e)),
            }
        }
        Ok(self.memory.lock().remove(key).is_some())
    }
}
