// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Authorization rules: required scopes plus an optional custom predicate.
//!
//! A rule is keyed by resource name (for the gateway, the tool name).
//! Evaluation is deny-by-default: scope subset first, then the predicate
//! if one is attached. Both failure modes are distinguishable so audit
//! consumers can tell a scope gap from a predicate veto.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::principal::AuthContext;

/// A caller-supplied authorization predicate.
///
/// Wrapped in a newtype so rules stay `Clone` and the missing-predicate
/// case is an explicit `Option`, not a null function pointer.
#[derive(Clone)]
pub struct RulePredicate(Arc<dyn Fn(&AuthContext) -> bool + Send + Sync>);

impl RulePredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&AuthContext) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn check(&self, ctx: &AuthContext) -> bool {
        (self.0)(ctx)
    }
}

impl std::fmt::Debug for RulePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RulePredicate(..)")
    }
}

/// Why an authorization check denied the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzDenial {
    /// Default-deny: no rule is registered for the resource.
    #[error("no authorization rule for resource '{resource}'")]
    NoRuleForResource { resource: String },

    /// The principal lacks one or more required scopes.
    #[error("missing required scopes: {missing:?}")]
    MissingScopes { missing: Vec<String> },

    /// The rule's custom predicate returned false.
    #[error("denied by custom authorization check")]
    PredicateDenied,
}

impl AuthzDenial {
    /// Stable machine-readable kind, used in audit metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoRuleForResource { .. } => "no_rule_for_resource",
            Self::MissingScopes { .. } => "missing_scopes",
            Self::PredicateDenied => "predicate_denied",
        }
    }
}

/// Per-resource authorization rule.
#[derive(Debug, Clone)]
pub struct AuthorizationRule {
    /// Resource this rule guards; unique key in the verifier's table.
    pub resource: String,

    /// Scopes the principal must hold, all of them.
    pub required_scopes: Vec<String>,

    /// Optional custom check, consulted only after the scope check passes.
    pub predicate: Option<RulePredicate>,
}

impl AuthorizationRule {
    pub fn new(resource: impl Into<String>, required_scopes: Vec<String>) -> Self {
        Self {
            resource: resource.into(),
            required_scopes,
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: RulePredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Evaluate this rule against a principal.
    pub fn evaluate(&self, ctx: &AuthContext) -> Result<(), AuthzDenial> {
        let missing: Vec<String> = self
            .required_scopes
            .iter()
            .filter(|s| !ctx.has_scope(s))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(AuthzDenial::MissingScopes { missing });
        }

        if let Some(predicate) = &self.predicate {
            if !predicate.check(ctx) {
                return Err(AuthzDenial::PredicateDenied);
            }
        }

        Ok(())
    }
}
