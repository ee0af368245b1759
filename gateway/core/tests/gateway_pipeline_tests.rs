// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end pipeline scenarios: a real gateway, real tokens, real
//! clock. Each test drives `handle_call_tool` the way a transport would
//! and asserts both the response and the audit trail.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use aegis_gateway_core::application::middleware::{MiddlewareFn, MiddlewareVerdict};
use aegis_gateway_core::domain::authorization::RulePredicate;
use aegis_gateway_core::domain::vault::CredentialStore;
use aegis_gateway_core::domain::mcp::Request;
use aegis_gateway_core::domain::tool::{SecurityContext, ToolDefinition, ToolError, ToolHandler};
use aegis_gateway_core::infrastructure::rate_limiter::RateLimitConfig;
use aegis_gateway_core::infrastructure::token_vault::VaultConfig;
use aegis_gateway_core::{GatewayConfig, SecureGateway};

struct EchoTool;

#[async_trait]
impl ToolHandler for EchoTool {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        Ok(json!({ "params": params, "caller": ctx.auth.user_id }))
    }
}

struct FailingTool;

#[async_trait]
impl ToolHandler for FailingTool {
    async fn call(&self, _params: Value, _ctx: SecurityContext) -> Result<Value, ToolError> {
        Err(ToolError::ExecutionError("backend unreachable".into()))
    }
}

/// Reads back a secret the embedder put in the vault, through the
/// handler-facing SecurityContext.
struct PeekSecretTool;

#[async_trait]
impl ToolHandler for PeekSecretTool {
    async fn call(&self, params: Value, ctx: SecurityContext) -> Result<Value, ToolError> {
        let service = params
            .get("service")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidParameters("service is required".into()))?;
        let key = format!("{}:{}", ctx.auth.user_id, service);
        let stored = ctx
            .vault
            .retrieve(&key)
            .await
            .map_err(|e| ToolError::ExecutionError(e.to_string()))?;
        Ok(json!({ "present": stored.is_some() }))
    }
}

fn config() -> GatewayConfig {
    GatewayConfig::new("pipeline-test", "0.0.0", "integration-secret").with_vault(VaultConfig {
        service_name: "aegis-gateway-pipeline-tests".into(),
        fallback_to_memory: true,
    })
}

fn echo(name: &str) -> ToolDefinition {
    ToolDefinition::new(name, "echoes params and caller", json!({"type": "object"}), Arc::new(EchoTool))
}

fn call(tool: &str, token: &str, arguments: Value) -> Request {
    Request::new(
        "tools/call",
        json!({ "name": tool, "arguments": arguments, "_token": token }),
    )
}

fn error_kind(response: &aegis_gateway_core::domain::mcp::Response) -> String {
    response.as_error().unwrap().data.as_ref().unwrap()["kind"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_happy_path_emits_one_success_audit_entry() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway.register_tool(echo("t").with_required_scopes(["read"])).await;

    let grant = gateway
        .create_session("u1", Some(vec!["read".into()]), None)
        .await
        .unwrap();
    let response = gateway
        .handle_call_tool(call("t", &grant.token, json!({"x": 1})))
        .await;

    assert!(response.is_success());
    let text = response.result().unwrap()["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["params"]["x"], 1);
    assert_eq!(payload["caller"], "u1");

    let calls = gateway.audit().by_action("tool_call", 10);
    assert_eq!(calls.len(), 1);
    let entry = &calls[0];
    assert!(entry.is_success());
    assert_eq!(entry.user_id.as_deref(), Some("u1"));
    assert_eq!(entry.resource.as_deref(), Some("t"));
    assert_eq!(entry.session_id.as_deref(), Some(grant.session_id.to_string().as_str()));
}

#[tokio::test]
async fn test_expired_token_is_rejected_with_its_kind() {
    let gateway = SecureGateway::new(config().with_token_expiry_secs(1)).unwrap();
    gateway.register_tool(echo("t")).await;

    let grant = gateway.create_session("u1", None, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_100)).await;

    let response = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;
    assert_eq!(error_kind(&response), "token_expired");

    let calls = gateway.audit().by_action("tool_call", 10);
    assert_eq!(calls.len(), 1);
    assert!(!calls[0].is_success());
}

#[tokio::test]
async fn test_missing_scope_is_denied_before_the_handler() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway.register_tool(echo("t").with_required_scopes(["write"])).await;

    let grant = gateway
        .create_session("u1", Some(vec!["read".into()]), None)
        .await
        .unwrap();
    let response = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;

    assert_eq!(error_kind(&response), "missing_scopes");
    let entry = &gateway.audit().by_action("tool_call", 10)[0];
    assert!(!entry.is_success());
    assert_eq!(entry.resource.as_deref(), Some("t"));
    assert_eq!(entry.user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_rate_limit_window_admits_then_denies_then_recovers() {
    let gateway = SecureGateway::new(config().with_rate_limit(RateLimitConfig {
        window: Duration::from_millis(1_000),
        max_requests: 3,
    }))
    .unwrap();
    gateway.register_tool(echo("t")).await;
    let grant = gateway.create_session("u1", None, None).await.unwrap();

    for _ in 0..3 {
        let response = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;
        assert!(response.is_success());
    }

    let fourth = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;
    assert_eq!(error_kind(&fourth), "rate_limit_exceeded");

    tokio::time::sleep(Duration::from_millis(1_100)).await;
    let fifth = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;
    assert!(fifth.is_success());

    // 4 successes, 1 denial, all for u1
    let calls = gateway.audit().by_action("tool_call", 10);
    assert_eq!(calls.len(), 5);
    assert_eq!(calls.iter().filter(|e| e.is_success()).count(), 4);
}

#[tokio::test]
async fn test_tool_not_found_fails_first() {
    let gateway = SecureGateway::new(config()).unwrap();
    // no token at all: resolution still fails before auth is consulted
    let response = gateway
        .handle_call_tool(Request::new("tools/call", json!({ "name": "ghost" })))
        .await;
    assert_eq!(error_kind(&response), "tool_not_found");
    assert_eq!(response.as_error().unwrap().code, -32601);

    let entry = &gateway.audit().by_action("tool_call", 10)[0];
    assert_eq!(entry.resource.as_deref(), Some("ghost"));
    assert!(entry.user_id.is_none());
}

#[tokio::test]
async fn test_missing_token_is_auth_required() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway.register_tool(echo("t")).await;

    let response = gateway
        .handle_call_tool(Request::new("tools/call", json!({ "name": "t", "arguments": {} })))
        .await;
    assert_eq!(error_kind(&response), "auth_required");
}

#[tokio::test]
async fn test_destroyed_session_invalidates_outstanding_tokens() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway.register_tool(echo("t")).await;
    let grant = gateway.create_session("u1", None, None).await.unwrap();

    assert!(gateway.destroy_session(&grant.session_id).await);

    let response = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;
    assert_eq!(error_kind(&response), "session_not_found");
    assert_eq!(response.as_error().unwrap().code, -32002);
}

#[tokio::test]
async fn test_custom_predicate_denies_with_its_own_kind() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway
        .register_tool(
            echo("admin_only")
                .with_required_scopes(["read"])
                .with_custom_auth_check(RulePredicate::new(|ctx| ctx.user_id == "root")),
        )
        .await;

    let denied = gateway
        .create_session("u1", Some(vec!["read".into()]), None)
        .await
        .unwrap();
    let response = gateway
        .handle_call_tool(call("admin_only", &denied.token, json!({})))
        .await;
    assert_eq!(error_kind(&response), "predicate_denied");

    let admitted = gateway
        .create_session("root", Some(vec!["read".into()]), None)
        .await
        .unwrap();
    let response = gateway
        .handle_call_tool(call("admin_only", &admitted.token, json!({})))
        .await;
    assert!(response.is_success());
}

#[tokio::test]
async fn test_middlewares_run_in_order_and_may_transform() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway.register_tool(echo("t")).await;

    gateway
        .use_middleware(Arc::new(MiddlewareFn(|mut req: Request, _ctx: &SecurityContext| {
            req.params["first"] = json!(1);
            MiddlewareVerdict::Continue(req)
        })))
        .await;
    gateway
        .use_middleware(Arc::new(MiddlewareFn(|mut req: Request, _ctx: &SecurityContext| {
            // sees the first middleware's edit
            let seen = req.params.get("first").is_some();
            req.params["second"] = json!(seen);
            MiddlewareVerdict::Continue(req)
        })))
        .await;

    let grant = gateway.create_session("u1", None, None).await.unwrap();
    let response = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;

    let text = response.result().unwrap()["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["params"]["first"], 1);
    assert_eq!(payload["params"]["second"], true);
}

#[tokio::test]
async fn test_blocking_middleware_stops_the_call() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway.register_tool(echo("t")).await;
    gateway
        .use_middleware(Arc::new(MiddlewareFn(|req: Request, _ctx: &SecurityContext| {
            if req.params.get("forbidden").is_some() {
                MiddlewareVerdict::Block
            } else {
                MiddlewareVerdict::Continue(req)
            }
        })))
        .await;

    let grant = gateway.create_session("u1", None, None).await.unwrap();

    let blocked = gateway
        .handle_call_tool(call("t", &grant.token, json!({"forbidden": true})))
        .await;
    assert_eq!(error_kind(&blocked), "blocked_by_middleware");
    assert_eq!(blocked.as_error().unwrap().code, -32005);

    let allowed = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;
    assert!(allowed.is_success());
}

#[tokio::test]
async fn test_handler_failure_audits_as_error() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway
        .register_tool(ToolDefinition::new(
            "flaky",
            "always fails",
            json!({"type": "object"}),
            Arc::new(FailingTool),
        ))
        .await;

    let grant = gateway.create_session("u1", None, None).await.unwrap();
    let response = gateway.handle_call_tool(call("flaky", &grant.token, json!({}))).await;

    assert_eq!(error_kind(&response), "handler_failed");
    assert_eq!(response.as_error().unwrap().code, -32603);

    let entry = &gateway.audit().by_action("tool_call", 10)[0];
    assert_eq!(entry.result, aegis_gateway_core::domain::audit::AuditOutcome::Error);
    let metadata = entry.metadata.as_ref().unwrap();
    assert!(metadata["error"].as_str().unwrap().contains("backend unreachable"));
}

#[tokio::test]
async fn test_handlers_reach_the_vault_through_their_context() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway
        .register_tool(ToolDefinition::new(
            "peek_secret",
            "reports whether a credential exists for the caller",
            json!({"type": "object", "properties": {"service": {"type": "string"}}}),
            Arc::new(PeekSecretTool),
        ))
        .await;

    // the embedder provisions a credential under the composite key
    gateway.vault().store("u1:vikunja", "api-token").await.unwrap();

    let grant = gateway.create_session("u1", None, None).await.unwrap();
    let response = gateway
        .handle_call_tool(call("peek_secret", &grant.token, json!({"service": "vikunja"})))
        .await;

    let text = response.result().unwrap()["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["present"], true);

    // a different caller's key space is disjoint
    let other = gateway.create_session("u2", None, None).await.unwrap();
    let response = gateway
        .handle_call_tool(call("peek_secret", &other.token, json!({"service": "vikunja"})))
        .await;
    let text = response.result().unwrap()["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["present"], false);
}

#[tokio::test]
async fn test_stop_clears_sessions_and_keeps_audit() {
    let gateway = SecureGateway::new(config()).unwrap();
    gateway.register_tool(echo("t")).await;
    let grant = gateway.create_session("u1", None, None).await.unwrap();

    gateway.stop().await;

    assert_eq!(gateway.sessions().active_session_count().await, 0);
    let response = gateway.handle_call_tool(call("t", &grant.token, json!({}))).await;
    assert_eq!(error_kind(&response), "session_not_found");

    // the ring survives shutdown
    assert!(gateway.audit().entry_count() > 0);
}
