// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aegis-gateway status` - report the vault backend and stored keys.

use anyhow::Result;
use colored::Colorize;

use aegis_gateway_core::domain::vault::CredentialStore;

use super::VaultArgs;

/// Probe key used to detect whether the keyring actually works; written
/// and removed in one pass.
const PROBE_KEY: &str = "__aegis_gateway_probe__";

pub async fn run(vault_args: &VaultArgs) -> Result<()> {
    let vault = vault_args.open();

    // exercise the backend once so demotion (if any) is observable
    let probe = vault.store(PROBE_KEY, "probe").await;
    if probe.is_ok() {
        let _ = vault.delete(PROBE_KEY).await;
    }

    println!("{}", "aegis-gateway status".bold());
    println!("  vault service:   {}", vault_args.service_name);
    match (&probe, vault.is_using_keyring()) {
        (Ok(()), true) => println!("  vault backend:   {}", "OS keyring".green()),
        (Ok(()), false) => println!(
            "  vault backend:   {} (keyring unavailable)",
            "memory".yellow()
        ),
        (Err(e), _) => println!("  vault backend:   {} ({e})", "unavailable".red()),
    }

    let keys = vault.list_keys();
    println!("  memory entries:  {}", keys.len());
    for key in keys {
        println!("    - {key}");
    }
    println!(
        "  {}",
        "note: keyring-held entries are opaque and not listed".dimmed()
    );
    Ok(())
}
