// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Per-resource authorization decisions.
//!
//! One rule per resource name, default-deny for everything unnamed.
//! Evaluation order inside a rule is fixed: scope subset, then the
//! custom predicate.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::authorization::{AuthorizationRule, AuthzDenial};
use crate::domain::principal::AuthContext;

/// Evaluates `(resource, principal)` pairs against registered rules.
pub struct RequestVerifier {
    rules: RwLock<HashMap<String, AuthorizationRule>>,
}

impl RequestVerifier {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the rule for `rule.resource`.
    pub fn add_rule(&self, rule: AuthorizationRule) {
        self.rules.write().insert(rule.resource.clone(), rule);
    }

    /// Remove the rule for `resource`. Returns whether one existed.
    pub fn remove_rule(&self, resource: &str) -> bool {
        self.rules.write().remove(resource).is_some()
    }

    pub fn clear_rules(&self) {
        self.rules.write().clear();
    }

    /// Snapshot of all registered rules.
    pub fn rules(&self) -> Vec<AuthorizationRule> {
        self.rules.read().values().cloned().collect()
    }

    /// Authorize `ctx` against the rule for `resource`.
    pub fn verify(&self, resource: &str, ctx: &AuthContext) -> Result<(), AuthzDenial> {
        let rules = self.rules.read();
        let rule = rules.get(resource).ok_or_else(|| AuthzDenial::NoRuleForResource {
            resource: resource.to_string(),
        })?;
        rule.evaluate(ctx)
    }
}

impl Default for RequestVerifier {
    fn default() -> Self {
        Self::new()
    }
}
