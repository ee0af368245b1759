// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aegis-gateway rotate` - replace a stored credential.

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
    let secret = secret_or_prompt(secret, &format!("New secret for {service}"))?;
    let vault = vault_args.open();
    let key = vault_key(user, service);

    let existed = vault
        .exists(&key)
        .await
        .with_context(|| format!("failed to inspect credential '{key}'"))?;
    vault
        .store(&key, &secret)
        .await
        .with_context(|| format!("failed to rotate credential '{key}'"))?;

    if existed {
        println!("{} credential '{}' rotated", "ok:".green().bold(), key);
    } else {
        println!(
            "{} no previous credential under '{}'; stored the new one",
            "note:".yellow().bold(),
            key
        );
    }
    Ok(())
}
