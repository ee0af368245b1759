// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Credential tools over the gateway vault.
//!
//! Secrets are filed under the `"{userId}:{service}"` composite key, so
//! a caller can only ever address its own slice of the vault. Nothing
//! here echoes secret material back to the caller: `credential_peek`
//! reports presence, not contents.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use aegis_gateway_core::domain::tool::{SecurityContext, ToolDefinition, ToolError, ToolHandler};
use aegis_gateway_core::SecureGateway;

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidParameters(format!("'{key}' is required")))
}

fn vault_key(user_id: &str, service: &str) -> String {
    format!("{user_id}:{service}")
}

struct CredentialStoreTool;

#[async_trait]
impl ToolHandler for CredentialStoreTool {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let service = required_str(&params, "service")?;
        let secret = required_str(&params, "secret")?;

        ctx.vault
            .store(&vault_key(&ctx.auth.user_id, service), secret)
            .await
            .map_err(|e| ToolError::ExecutionError(e.to_string()))?;
        Ok(json!({ "stored": true, "service": service }))
    }
}

struct CredentialPeekTool;

#[async_trait]
impl ToolHandler for CredentialPeekTool {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let service = required_str(&params, "service")?;

        let present = ctx
            .vault
            .exists(&vault_key(&ctx.auth.user_id, service))
            .await
            .map_err(|e| ToolError::ExecutionError(e.to_string()))?;
        Ok(json!({ "service": service, "present": present }))
    }
}

struct CredentialDeleteTool;

#[async_trait]
impl ToolHandler for CredentialDeleteTool {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let service = required_str(&params, "service")?;

        let removed = ctx
            .vault
            .delete(&vault_key(&ctx.auth.user_id, service))
            .await
            .map_err(|e| ToolError::ExecutionError(e.to_string()))?;
        Ok(json!({ "service": service, "removed": removed }))
    }
}

fn service_schema(with_secret: bool) -> Value {
    let mut properties = json!({ "service": { "type": "string" } });
    let mut required = vec!["service"];
    if with_secret {
        properties["secret"] = json!({ "type": "string" });
        required.push("secret");
    }
    json!({ "type": "object", "properties": properties, "required": required })
}

/// Register the credential tools.
pub async fn register_credential_tools(gateway: &SecureGateway) {
    gateway
        .register_tool(
            ToolDefinition::new(
                "credential_store",
                "Store a service credential for the calling user",
                service_schema(true),
                Arc::new(CredentialStoreTool),
            )
            .with_required_scopes(["credentials:write"]),
        )
        .await;

    gateway
        .register_tool(
            ToolDefinition::new(
                "credential_peek",
                "Report whether a service credential exists for the calling user",
                service_schema(false),
                Arc::new(CredentialPeekTool),
            )
            .with_required_scopes(["credentials:read"]),
        )
        .await;

    gateway
        .register_tool(
            ToolDefinition::new(
                "credential_delete",
                "Delete a service credential for the calling user",
                service_schema(false),
                Arc::new(CredentialDeleteTool),
            )
            .with_required_scopes(["credentials:write"]),
        )
        .await;
}
