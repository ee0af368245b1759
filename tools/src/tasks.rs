// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Task-tracker tool handlers.
//!
//! Each handler decodes only the parameters it cares about and scopes
//! every store operation to the authenticated caller. Authorization is
//! declared on the tool definitions and enforced by the gateway before
//! any of this code runs.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use aegis_gateway_core::domain::authorization::RulePredicate;
use aegis_gateway_core::domain::tool::{SecurityContext, ToolDefinition, ToolError, ToolHandler};
use aegis_gateway_core::SecureGateway;

use crate::store::TaskStore;

fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidParameters(format!("'{key}' is required")))
}

fn required_task_id(params: &Value) -> Result<Uuid, ToolError> {
    required_str(params, "taskId")?
        .parse()
        .map_err(|_| ToolError::InvalidParameters("'taskId' must be a UUID".into()))
}

struct TaskCreate {
    store: Arc<TaskStore>,
}

#[async_trait]
impl ToolHandler for TaskCreate {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let title = required_str(&params, "title")?;
        if title.trim().is_empty() {
            return Err(ToolError::InvalidParameters("'title' must not be blank".into()));
        }
        let task = self.store.create(&ctx.auth.user_id, title.trim()).await;
        debug!(user = %ctx.auth.user_id, task = %task.id, "task created");
        Ok(json!({ "task": task }))
    }
}

struct TaskList {
    store: Arc<TaskStore>,
}

#[async_trait]
impl ToolHandler for TaskList {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let open_only = params
            .get("openOnly")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let tasks = self.store.list(&ctx.auth.user_id, open_only).await;
        let count = tasks.len();
        Ok(json!({ "tasks": tasks, "count": count }))
    }
}

struct TaskComplete {
    store: Arc<TaskStore>,
}

#[async_trait]
impl ToolHandler for TaskComplete {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let task_id = required_task_id(&params)?;
        match self.store.complete(&ctx.auth.user_id, task_id).await {
            Some(task) => Ok(json!({ "task": task })),
            None => Err(ToolError::ExecutionError(format!("no such task: {task_id}"))),
        }
    }
}

struct TaskDelete {
    store: Arc<TaskStore>,
}

#[async_trait]
impl ToolHandler for TaskDelete {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let task_id = required_task_id(&params)?;
        let deleted = self.store.delete(&ctx.auth.user_id, task_id).await;
        if !deleted {
            return Err(ToolError::ExecutionError(format!("no such task: {task_id}")));
        }
        Ok(json!({ "deleted": true }))
    }
}

fn title_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "title": { "type": "string" } },
        "required": ["title"]
    })
}

fn task_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "taskId": { "type": "string", "format": "uuid" } },
        "required": ["taskId"]
    })
}

/// Register the four task tools against a shared store.
///
/// `task_delete` carries a custom check on top of its scope: guest
/// principals (user ids starting with `guest-`) cannot delete, whatever
/// scopes their session was granted.
pub async fn register_task_tools(gateway: &SecureGateway, store: Arc<TaskStore>) {
    gateway
        .register_tool(
            ToolDefinition::new(
                "task_create",
                "Create a task for the calling user",
                title_schema(),
                Arc::new(TaskCreate {
                    store: Arc::clone(&store),
                }),
            )
            .with_required_scopes(["tasks:write"]),
        )
        .await;

    gateway
        .register_tool(
            ToolDefinition::new(
                "task_list",
                "List the calling user's tasks",
                json!({
                    "type": "object",
                    "properties": { "openOnly": { "type": "boolean" } }
                }),
                Arc::new(TaskList {
                    store: Arc::clone(&store),
                }),
            )
            .with_required_scopes(["tasks:read"]),
        )
        .await;

    gateway
        .register_tool(
            ToolDefinition::new(
                "task_complete",
                "Mark one of the calling user's tasks as done",
                task_id_schema(),
                Arc::new(TaskComplete {
                    store: Arc::clone(&store),
                }),
            )
            .with_required_scopes(["tasks:write"]),
        )
        .await;

    gateway
        .register_tool(
            ToolDefinition::new(
                "task_delete",
                "Delete one of the calling user's tasks",
                task_id_schema(),
                Arc::new(TaskDelete { store }),
            )
            .with_required_scopes(["tasks:delete"])
            .with_custom_auth_check(RulePredicate::new(|ctx| {
                !ctx.user_id.starts_with("guest-")
            })),
        )
        .await;
}
