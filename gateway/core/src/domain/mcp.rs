// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Transport-agnostic request/response shapes.
//!
//! The core consumes a [`Request`] and produces a [`Response`]; framing
//! (stdio lines, HTTP bodies) is the transport's job. For tool calls the
//! open `params` mapping carries `name`, `arguments`, and the bearer
//! token under `_token`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Key inside `params` that carries the bearer token for a tool call.
pub const TOKEN_PARAM: &str = "_token";

/// A protocol request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub method: String,

    /// Open mapping; the core never assumes a schema beyond the keys it
    /// reads itself (`name`, `arguments`, `_token`).
    #[serde(default)]
    pub params: Value,

    /// Transport headers, passed through untouched for middlewares.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            headers: None,
        }
    }

    /// The tool name of a `tools/call` request (`params.name`).
    pub fn tool_name(&self) -> Option<&str> {
        self.params.get("name").and_then(Value::as_str)
    }

    /// The tool argument object (`params.arguments`), `null` if absent.
    pub fn arguments(&self) -> Value {
        self.params.get("arguments").cloned().unwrap_or(Value::Null)
    }

    /// The bearer token (`params._token`).
    pub fn token(&self) -> Option<&str> {
        self.params.get(TOKEN_PARAM).and_then(Value::as_str)
    }
}

/// JSON-RPC error value returned when a request fails.
///
/// `message` never carries secrets or token contents, only the kind name and
/// a short reason only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MCPError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl MCPError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A protocol response: exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Success { result: Value },
    Failure { error: MCPError },
}

impl Response {
    pub fn success(result: Value) -> Self {
        Self::Success { result }
    }

    pub fn error(error: MCPError) -> Self {
        Self::Failure { error }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result } => Some(result),
            Self::Failure { .. } => None,
        }
    }

    pub fn as_error(&self) -> Option<&MCPError> {
        match self {
            Self::Failure { error } => Some(error),
            Self::Success { .. } => None,
        }
    }
}

/// Render a tool handler's output as an MCP text content payload.
pub fn render_tool_result(value: &Value) -> Value {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    json!({ "content": [{ "type": "text", "text": text }] })
}
