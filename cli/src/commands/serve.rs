// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aegis-gateway serve` - run the gateway over stdio.
//!
//! Assembles a gateway from the command line, registers the sample tool
//! set, and speaks newline-delimited JSON-RPC on stdin/stdout until the
//! peer closes the stream.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use aegis_gateway_core::infrastructure::rate_limiter::RateLimitConfig;
use aegis_gateway_core::presentation::stdio;
use aegis_gateway_core::{GatewayConfig, SecureGateway};
use aegis_gateway_tools::register_sample_tools;

use super::VaultArgs;

pub struct ServeArgs {
    pub vault: VaultArgs,
    pub name: String,
    pub signing_secret: Option<String>,
    pub session_expiry_ms: u64,
    pub token_expiry_secs: i64,
    pub rate_window_ms: u64,
    pub rate_max_requests: u32,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let signing_secret = args
        .signing_secret
        .context("a signing secret is required: pass --signing-secret or set AEGIS_GATEWAY_SECRET")?;

    let config = GatewayConfig::new(args.name, clap::crate_version!(), signing_secret)
        .with_session_expiry(Duration::from_millis(args.session_expiry_ms))
        .with_token_expiry_secs(args.token_expiry_secs)
        .with_rate_limit(RateLimitConfig {
            window: Duration::from_millis(args.rate_window_ms),
            max_requests: args.rate_max_requests,
        })
        .with_vault(args.vault.to_config());

    let gateway = Arc::new(SecureGateway::new(config).context("invalid gateway configuration")?);
    register_sample_tools(&gateway).await;

    info!(
        name = gateway.name(),
        tools = gateway.handle_list_tools().await.len(),
        "serving over stdio"
    );

    let result = stdio::serve_stdio(Arc::clone(&gateway)).await;
    gateway.stop().await;
    result.context("stdio transport failed")
}
