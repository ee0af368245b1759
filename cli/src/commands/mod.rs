// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod configure;
pub mod rotate;
pub mod serve;
pub mod status;

use aegis_gateway_core::infrastructure::token_vault::{TokenVault, VaultConfig};

/// Vault options shared by every subcommand.
pub struct VaultArgs {
    pub service_name: String,
    pub fallback_to_memory: bool,
}

impl VaultArgs {
    pub fn open(&self) -> TokenVault {
        TokenVault::new(VaultConfig {
            service_name: self.service_name.clone(),
            fallback_to_memory: self.fallback_to_memory,
        })
    }

    pub fn to_config(&self) -> VaultConfig {
        VaultConfig {
            service_name: self.service_name.clone(),
            fallback_to_memory: self.fallback_to_memory,
        }
    }
}

/// Prompt for a secret when it was not passed on the command line.
pub fn secret_or_prompt(secret: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match secret {
        Some(secret) => Ok(secret),
        None => Ok(dialoguer::Password::new()
            .with_prompt(prompt)
            .interact()?),
    }
}

/// The `"{userId}:{service}"` vault key convention.
pub fn vault_key(user: &str, service: &str) -> String {
    format!("{user}:{service}")
}
