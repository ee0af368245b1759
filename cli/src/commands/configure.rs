// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aegis-gateway configure` - store a service credential in the vault.

use anyhow::{Context, Result};
use colored::Colorize;

use aegis_gateway_core::domain::vault::CredentialStore;

use super::{secret_or_prompt, vault_key, VaultArgs};

pub async fn run(
    vault_args: &VaultArgs,
    user: &str,
    service: &str,
    secret: Option<String>,
) -> Result<()> {
    let secret = secret_or_prompt(secret, &format!("Secret for {service}"))?;
    let vault = vault_args.open();
    let key = vault_key(user, service);

    vault
        .store(&key, &secret)
        .await
        .with_context(|| format!("failed to store credential '{key}'"))?;

    println!("{} credential stored under '{}'", "ok:".green().bold(), key);
    if !vault.is_using_keyring() {
        println!(
            "{} OS keyring unavailable; the credential lives in process memory only",
            "warning:".yellow().bold()
        );
    }
    Ok(())
}
