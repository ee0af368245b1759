// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tool registration surface.
//!
//! Tools are opaque handlers registered by name. The gateway never
//! validates tool parameters: `input_schema` is published for discovery
//! and each handler decodes the subset of `params` it cares about.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::authorization::RulePredicate;
use crate::domain::principal::AuthContext;
use crate::domain::vault::CredentialStore;

/// Failure surfaced by a tool handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("execution failed: {0}")]
    ExecutionError(String),
}

/// Everything a tool handler may touch beyond its own parameters: the
/// authenticated principal and a read-through handle to the vault.
#[derive(Clone)]
pub struct SecurityContext {
    pub auth: AuthContext,
    pub vault: Arc<dyn CredentialStore>,
}

impl SecurityContext {
    pub fn new(auth: AuthContext, vault: Arc<dyn CredentialStore>) -> Self {
        Self { auth, vault }
    }
}

impl std::fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityContext")
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

/// A tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError>;
}

/// Published description of a tool, as returned by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolMetadata {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A registered tool: discovery metadata, declared authorization
/// requirements, and the handler itself.
///
/// Re-registering the same name overwrites the previous definition.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,

    /// Scopes the caller must hold. Empty means any authenticated caller.
    pub required_scopes: Vec<String>,

    /// Extra per-call check evaluated after the scope check.
    pub custom_auth_check: Option<RulePredicate>,

    pub handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            required_scopes: Vec::new(),
            custom_auth_check: None,
            handler,
        }
    }

    pub fn with_required_scopes<S: Into<String>>(
        mut self,
        scopes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.required_scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_custom_auth_check(mut self, predicate: RulePredicate) -> Self {
        self.custom_auth_check = Some(predicate);
        self
    }

    /// Whether this tool declares any authorization requirement at all.
    pub fn requires_authorization(&self) -> bool {
        !self.required_scopes.is_empty() || self.custom_auth_check.is_some()
    }

    pub fn metadata(&self) -> ToolMetadata {
        ToolMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("required_scopes", &self.required_scopes)
            .field("has_custom_auth_check", &self.custom_auth_check.is_some())
            .finish_non_exhaustive()
    }
}
