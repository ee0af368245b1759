// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The sample tool set driven through a real gateway: scopes, the guest
//! predicate, per-user isolation, and the vault key convention.

use serde_json::{json, Value};

use aegis_gateway_core::domain::mcp::{Request, Response};
use aegis_gateway_core::infrastructure::token_vault::VaultConfig;
use aegis_gateway_core::{GatewayConfig, SecureGateway};
use aegis_gateway_tools::register_sample_tools;

const FULL_SCOPES: &[&str] = &[
    "tasks:read",
    "tasks:write",
    "tasks:delete",
    "credentials:read",
    "credentials:write",
];

async fn gateway() -> SecureGateway {
    let gateway = SecureGateway::new(
        GatewayConfig::new("tools-test", "0.0.0", "tools-secret").with_vault(VaultConfig {
            service_name: "aegis-gateway-tools-tests".into(),
            fallback_to_memory: true,
        }),
    )
    .unwrap();
    register_sample_tools(&gateway).await;
    gateway
}

async fn session(gateway: &SecureGateway, user: &str, scopes: &[&str]) -> String {
    gateway
        .create_session(user, Some(scopes.iter().map(|s| s.to_string()).collect()), None)
        .await
        .unwrap()
        .token
}

async fn invoke(gateway: &SecureGateway, token: &str, tool: &str, arguments: Value) -> Response {
    gateway
        .handle_call_tool(Request::new(
            "tools/call",
            json!({ "name": tool, "arguments": arguments, "_token": token }),
        ))
        .await
}

fn payload(response: &Response) -> Value {
    let text = response.result().expect("expected a success response")["content"][0]["text"]
        .as_str()
        .unwrap();
    serde_json::from_str(text).unwrap()
}

fn error_kind(response: &Response) -> String {
    response.as_error().unwrap().data.as_ref().unwrap()["kind"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_task_lifecycle_end_to_end() {
    let gateway = gateway().await;
    let token = session(&gateway, "alice", FULL_SCOPES).await;

    let created = invoke(&gateway, &token, "task_create", json!({"title": "write the brief"})).await;
    let task_id = payload(&created)["task"]["id"].as_str().unwrap().to_string();

    invoke(&gateway, &token, "task_create", json!({"title": "review the brief"})).await;

    let listed = payload(&invoke(&gateway, &token, "task_list", json!({})).await);
    assert_eq!(listed["count"], 2);

    let completed = payload(
        &invoke(&gateway, &token, "task_complete", json!({"taskId": task_id})).await,
    );
    assert_eq!(completed["task"]["done"], true);

    let open = payload(&invoke(&gateway, &token, "task_list", json!({"openOnly": true})).await);
    assert_eq!(open["count"], 1);

    let deleted = payload(&invoke(&gateway, &token, "task_delete", json!({"taskId": task_id})).await);
    assert_eq!(deleted["deleted"], true);
}

#[tokio::test]
async fn test_scope_gaps_are_enforced_per_tool() {
    let gateway = gateway().await;
    let reader = session(&gateway, "bob", &["tasks:read"]).await;

    let listed = invoke(&gateway, &reader, "task_list", json!({})).await;
    assert!(listed.is_success());

    let created = invoke(&gateway, &reader, "task_create", json!({"title": "nope"})).await;
    assert_eq!(error_kind(&created), "missing_scopes");
}

#[tokio::test]
async fn test_guest_predicate_blocks_delete_despite_scope() {
    let gateway = gateway().await;
    let guest = session(&gateway, "guest-7", FULL_SCOPES).await;

    let created = invoke(&gateway, &guest, "task_create", json!({"title": "temp"})).await;
    let task_id = payload(&created)["task"]["id"].as_str().unwrap().to_string();

    let deleted = invoke(&gateway, &guest, "task_delete", json!({"taskId": task_id})).await;
    assert_eq!(error_kind(&deleted), "predicate_denied");

    // the task survived the denied delete
    let listed = payload(&invoke(&gateway, &guest, "task_list", json!({})).await);
    assert_eq!(listed["count"], 1);
}

#[tokio::test]
async fn test_users_cannot_reach_each_others_tasks() {
    let gateway = gateway().await;
    let alice = session(&gateway, "alice", FULL_SCOPES).await;
    let mallory = session(&gateway, "mallory", FULL_SCOPES).await;

    let created = invoke(&gateway, &alice, "task_create", json!({"title": "private"})).await;
    let task_id = payload(&created)["task"]["id"].as_str().unwrap().to_string();

    let stolen = invoke(&gateway, &mallory, "task_complete", json!({"taskId": task_id})).await;
    assert_eq!(error_kind(&stolen), "handler_failed");

    let listed = payload(&invoke(&gateway, &mallory, "task_list", json!({})).await);
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn test_credential_tools_use_the_composite_key() {
    let gateway = gateway().await;
    let alice = session(&gateway, "alice", FULL_SCOPES).await;
    let bob = session(&gateway, "bob", FULL_SCOPES).await;

    let stored = invoke(
        &gateway,
        &alice,
        "credential_store",
        json!({"service": "vikunja", "secret": "s3cret"}),
    )
    .await;
    assert!(stored.is_success());

    // alice sees it, bob does not: disjoint key spaces
    let mine = payload(&invoke(&gateway, &alice, "credential_peek", json!({"service": "vikunja"})).await);
    assert_eq!(mine["present"], true);
    let theirs = payload(&invoke(&gateway, &bob, "credential_peek", json!({"service": "vikunja"})).await);
    assert_eq!(theirs["present"], false);

    // peek never echoes the secret
    assert!(mine.get("secret").is_none());

    let removed = payload(
        &invoke(&gateway, &alice, "credential_delete", json!({"service": "vikunja"})).await,
    );
    assert_eq!(removed["removed"], true);
    let removed_again = payload(
        &invoke(&gateway, &alice, "credential_delete", json!({"service": "vikunja"})).await,
    );
    assert_eq!(removed_again["removed"], false);
}

#[tokio::test]
async fn test_invalid_parameters_surface_as_handler_failures() {
    let gateway = gateway().await;
    let token = session(&gateway, "alice", FULL_SCOPES).await;

    let response = invoke(&gateway, &token, "task_create", json!({})).await;
    assert_eq!(error_kind(&response), "handler_failed");
    assert!(response
        .as_error()
        .unwrap()
        .message
        .contains("'title' is required"));

    let response = invoke(&gateway, &token, "task_complete", json!({"taskId": "not-a-uuid"})).await;
    assert_eq!(error_kind(&response), "handler_failed");
}
