// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Stdio transport glue: newline-delimited JSON-RPC 2.0.
//!
//! One request object per line in, one response object per line out.
//! The transport dispatches `tools/list` and `tools/call` to the
//! gateway and owns nothing else; auth, sessions, and audit all live
//! behind [`SecureGateway`]. Cancellation of an in-flight handler is a
//! transport concern; this loop simply awaits each call to completion.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error};

use crate::application::gateway::SecureGateway;
use crate::domain::mcp::{MCPError, Request, Response};

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Serve the gateway over a pair of byte streams. Production callers
/// pass stdin/stdout; tests pass in-memory pipes.
pub async fn serve<R, W>(gateway: Arc<SecureGateway>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => {
                let id = request.id.clone();
                let response = dispatch(&gateway, request).await;
                match id {
                    Some(id) => Some(render(id, response)),
                    // notifications get no response
                    None => None,
                }
            }
            Err(e) => {
                debug!(error = %e, "unparseable request line");
                Some(JsonRpcResponse::error(
                    Value::Null,
                    MCPError::new(-32700, "parse error"),
                ))
            }
        };

        if let Some(response) = response {
            let mut payload = serde_json::to_vec(&response).map_err(std::io::Error::other)?;
            payload.push(b'\n');
            writer.write_all(&payload).await?;
            writer.flush().await?;
        }
    }

    Ok(())
}

/// Serve over the process's stdin/stdout.
pub async fn serve_stdio(gateway: Arc<SecureGateway>) -> std::io::Result<()> {
    let result = serve(gateway, tokio::io::stdin(), tokio::io::stdout()).await;
    if let Err(e) = &result {
        error!(error = %e, "stdio transport terminated");
    }
    result
}

async fn dispatch(gateway: &SecureGateway, request: JsonRpcRequest) -> Response {
    match request.method.as_str() {
        "tools/list" => {
            let tools = gateway.handle_list_tools().await;
            Response::success(serde_json::json!({ "tools": tools }))
        }
        "tools/call" => {
            gateway
                .handle_call_tool(Request::new(request.method, request.params))
                .await
        }
        other => Response::error(MCPError::new(-32601, format!("method not found: {other}"))),
    }
}

fn render(id: Value, response: Response) -> JsonRpcResponse {
    match response {
        Response::Success { result } => JsonRpcResponse::result(id, result),
        Response::Failure { error } => JsonRpcResponse::error(id, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::GatewayConfig;
    use crate::domain::tool::{SecurityContext, ToolDefinition, ToolError, ToolHandler};
    use async_trait::async_trait;
    use serde_json::json;

    struct PingTool;

    #[async_trait]
    impl ToolHandler for PingTool {
        async fn call(&self, _params: Value, _ctx: SecurityContext) -> Result<Value, ToolError> {
            Ok(json!("pong"))
        }
    }

    async fn run_lines(gateway: Arc<SecureGateway>, input: String) -> Vec<Value> {
        let mut output = Vec::new();
        serve(gateway, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn gateway() -> Arc<SecureGateway> {
        Arc::new(SecureGateway::new(GatewayConfig::new("stdio-test", "0.0.0", "secret")).unwrap())
    }

    #[tokio::test]
    async fn test_list_then_call_roundtrip() {
        let gateway = gateway();
        gateway
            .register_tool(ToolDefinition::new(
                "ping",
                "liveness probe",
                json!({"type": "object"}),
                Arc::new(PingTool),
            ))
            .await;
        let grant = gateway.create_session("u1", None, None).await.unwrap();

        let input = format!(
            "{}\n{}\n",
            json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call",
                   "params": {"name": "ping", "arguments": {}, "_token": grant.token}}),
        );
        let responses = run_lines(gateway, input).await;

        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["tools"][0]["name"], "ping");
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "pong");
    }

    #[tokio::test]
    async fn test_unknown_method_and_parse_error() {
        let gateway = gateway();
        let input = format!(
            "{}\nthis is not json\n",
            json!({"jsonrpc": "2.0", "id": 7, "method": "prompts/list"}),
        );
        let responses = run_lines(gateway, input).await;

        assert_eq!(responses[0]["error"]["code"], -32601);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_transport_code() {
        let gateway = gateway();
        gateway
            .register_tool(ToolDefinition::new(
                "ping",
                "liveness probe",
                json!({"type": "object"}),
                Arc::new(PingTool),
            ))
            .await;

        let input = format!(
            "{}\n",
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "ping", "arguments": {}}}),
        );
        let responses = run_lines(gateway, input).await;

        assert_eq!(responses[0]["error"]["code"], -32001);
        assert_eq!(responses[0]["error"]["data"]["kind"], "auth_required");
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let gateway = gateway();
        let input = format!(
            "{}\n",
            json!({"jsonrpc": "2.0", "method": "tools/list"}),
        );
        let responses = run_lines(gateway, input).await;
        assert!(responses.is_empty());
    }
}
