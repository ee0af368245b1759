// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # aegis-gateway-tools
//!
//! The sample tool set shipped with the AEGIS MCP gateway: a per-user
//! task tracker plus a pair of credential tools exercising the vault.
//! The gateway treats these like any other registered tools; they exist
//! to show the scope, predicate, and vault conventions end to end.
//!
//! Scopes used:
//!
//! | Tool | Scopes | Extra check |
//! |---|---|---|
//! | `task_create` | `tasks:write` | – |
//! | `task_list` | `tasks:read` | – |
//! | `task_complete` | `tasks:write` | – |
//! | `task_delete` | `tasks:delete` | guest principals denied |
//! | `credential_store` | `credentials:write` | – |
//! | `credential_peek` | `credentials:read` | – |
//! | `credential_delete` | `credentials:write` | – |

pub mod store;
pub mod tasks;
pub mod credentials;

use std::sync::Arc;

use aegis_gateway_core::SecureGateway;

pub use store::{Task, TaskStore};

/// Register the whole sample tool set on a gateway, sharing one task
/// store across the task tools.
pub async fn register_sample_tools(gateway: &SecureGateway) -> Arc<TaskStore> {
    let store = Arc::new(TaskStore::new());
    tasks::register_task_tools(gateway, Arc::clone(&store)).await;
    credentials::register_credential_tools(gateway).await;
    store
}
