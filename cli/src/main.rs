// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # AEGIS Gateway CLI
//!
//! The `aegis-gateway` binary is a thin user of the vault and the
//! gateway:
//!
//! - `aegis-gateway configure` - store a service credential in the vault
//! - `aegis-gateway rotate` - replace a stored credential
//! - `aegis-gateway status` - report vault backend and stored keys
//! - `aegis-gateway serve` - run the gateway over stdio with the sample
//!   tool set registered
//!
//! The signing secret for `serve` comes from `--signing-secret` or the
//! `AEGIS_GATEWAY_SECRET` environment variable (a `.env` file is
//! honoured). Logs go to stderr so stdout stays clean for the protocol.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{configure, rotate, serve, status};

/// AEGIS MCP gateway - authenticated, authorized, audited tool calls
#[derive(Parser)]
#[command(name = "aegis-gateway")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Keyring service label for vault entries
    #[arg(
        long,
        global = true,
        env = "AEGIS_GATEWAY_VAULT_SERVICE",
        default_value = "aegis-gateway"
    )]
    vault_service: String,

    /// Fail on keyring errors instead of falling back to memory
    #[arg(long, global = true)]
    no_memory_fallback: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AEGIS_GATEWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a service credential in the vault
    Configure {
        /// User the credential belongs to
        #[arg(long)]
        user: String,

        /// Service name (vault key becomes "<user>:<service>")
        #[arg(long)]
        service: String,

        /// Secret value; prompted for when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Replace a stored credential
    Rotate {
        #[arg(long)]
        user: String,

        #[arg(long)]
        service: String,

        /// New secret value; prompted for when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Report the vault backend and stored keys
    Status,

    /// Run the gateway over stdio with the sample tools registered
    Serve {
        /// Gateway name; doubles as the token issuer
        #[arg(long, env = "AEGIS_GATEWAY_NAME", default_value = "aegis-gateway")]
        name: String,

        /// HMAC signing secret for bearer tokens
        #[arg(long, env = "AEGIS_GATEWAY_SECRET", hide_env_values = true)]
        signing_secret: Option<String>,

        /// Session lifetime in milliseconds
        #[arg(long, env = "AEGIS_GATEWAY_SESSION_EXPIRY_MS", default_value_t = 3_600_000)]
        session_expiry_ms: u64,

        /// Token lifetime in seconds
        #[arg(long, env = "AEGIS_GATEWAY_TOKEN_EXPIRY_SECS", default_value_t = 3_600)]
        token_expiry_secs: i64,

        /// Rate limit window in milliseconds
        #[arg(long, default_value_t = 60_000)]
        rate_window_ms: u64,

        /// Maximum requests per user per window
        #[arg(long, default_value_t = 100)]
        rate_max_requests: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; absence is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    let vault = commands::VaultArgs {
        service_name: cli.vault_service,
        fallback_to_memory: !cli.no_memory_fallback,
    };

    match cli.command {
        Commands::Configure {
            user,
            service,
            secret,
        } => configure::run(&vault, &user, &service, secret).await,
        Commands::Rotate {
            user,
            service,
            secret,
        } => rotate::run(&vault, &user, &service, secret).await,
        Commands::Status => status::run(&vault).await,
        Commands::Serve {
            name,
            signing_secret,
            session_expiry_ms,
            token_expiry_secs,
            rate_window_ms,
            rate_max_requests,
        } => {
            serve::run(serve::ServeArgs {
                vault,
                name,
                signing_secret,
                session_expiry_ms,
                token_expiry_secs,
                rate_window_ms,
                rate_max_requests,
            })
            .await
        }
    }
}
