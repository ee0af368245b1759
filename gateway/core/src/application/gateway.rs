// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The secure gateway: the pipeline assembling the security layer
//! around a tool registry.
//!
//! `handle_call_tool` runs a fixed nine-step sequence: resolve tool,
//! extract token, verify token, verify session, build the principal,
//! rate-limit, authorize, run middlewares, invoke the handler. The first
//! failing step determines the returned error kind; no later step
//! observes state from an aborted earlier one. Every pass, success or
//! failure, produces exactly one `tool_call` audit entry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::application::config::{ConfigError, GatewayConfig};
use crate::application::middleware::{Middleware, MiddlewareVerdict};
use crate::domain::audit::{AuditAction, AuditEntry, AuditOutcome};
use crate::domain::authorization::AuthorizationRule;
use crate::domain::error::GatewayError;
use crate::domain::mcp::{render_tool_result, Request, Response};
use crate::domain::principal::{default_scopes, AuthContext};
use crate::domain::session::{SessionError, SessionId};
use crate::domain::tool::{SecurityContext, ToolDefinition, ToolMetadata};
use crate::domain::vault::CredentialStore;
use crate::infrastructure::audit_logger::AuditLogger;
use crate::infrastructure::authenticator::{Authenticator, AuthenticatorConfig};
use crate::infrastructure::rate_limiter::RateLimiter;
use crate::infrastructure::request_verifier::RequestVerifier;
use crate::infrastructure::session_manager::{SessionConfig, SessionManager};
use crate::infrastructure::token_vault::TokenVault;

/// What `create_session` hands back: the minted token and the session
/// it is bound to.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    pub session_id: SessionId,
}

/// A failed pipeline pass, with whatever caller identity was known by
/// the time it failed.
struct CallFailure {
    error: GatewayError,
    user_id: Option<String>,
    session_id: Option<String>,
}

impl CallFailure {
    fn bare(error: GatewayError) -> Self {
        Self {
            error,
            user_id: None,
            session_id: None,
        }
    }

    fn identified(error: GatewayError, ctx: &AuthContext) -> Self {
        Self {
            error,
            user_id: Some(ctx.user_id.clone()),
            session_id: Some(ctx.session_id.to_string()),
        }
    }
}

/// The composed security gateway.
///
/// Owns one instance of each security component plus the tool and
/// middleware registries. Multiple gateways can coexist in one process;
/// there is no global state.
pub struct SecureGateway {
    name: String,
    version: String,
    authenticator: Authenticator,
    sessions: Arc<SessionManager>,
    rate_limiter: Arc<RateLimiter>,
    verifier: RequestVerifier,
    vault: Arc<TokenVault>,
    audit: Arc<AuditLogger>,
    tools: RwLock<HashMap<String, ToolDefinition>>,
    middlewares: RwLock<Vec<Arc<dyn Middleware>>>,
}

impl SecureGateway {
    /// Build a gateway and start its background sweepers.
    ///
    /// Must be called within a Tokio runtime. Fails only on invalid
    /// configuration, which is fatal for the embedding process.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let sessions = Arc::new(SessionManager::new(SessionConfig {
            session_expiry: config.session_expiry,
            cleanup_interval: config.cleanup_interval,
        }));
        sessions.spawn_sweeper();

        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit));
        rate_limiter.spawn_sweeper();

        let authenticator = Authenticator::new(AuthenticatorConfig {
            signing_secret: config.signing_secret,
            issuer: config.name.clone(),
            token_expiry_secs: config.token_expiry_secs,
        });

        info!(name = %config.name, version = %config.version, "secure gateway assembled");

        Ok(Self {
            name: config.name,
            version: config.version,
            authenticator,
            sessions,
            rate_limiter,
            verifier: RequestVerifier::new(),
            vault: Arc::new(TokenVault::new(config.vault)),
            audit: Arc::new(AuditLogger::new(config.audit)),
            tools: RwLock::new(HashMap::new()),
            middlewares: RwLock::new(Vec::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    // --- registries ---

    /// Install a tool. Re-registering a name overwrites the previous
    /// definition, and the authorization rule mirrors the declaration.
    pub async fn register_tool(&self, tool: ToolDefinition) {
        if tool.requires_authorization() {
            self.verifier.add_rule(Self::rule_for(&tool));
        } else {
            // an overwrite may drop a previously declared requirement
            self.verifier.remove_rule(&tool.name);
        }
        debug!(tool = %tool.name, "tool registered");
        self.tools.write().await.insert(tool.name.clone(), tool);
    }

    /// Remove a tool and its authorization rule. Returns whether the
    /// tool was registered.
    pub async fn unregister_tool(&self, name: &str) -> bool {
        self.verifier.remove_rule(name);
        self.tools.write().await.remove(name).is_some()
    }

    /// Append a middleware to the chain. Order of registration is order
    /// of execution.
    pub async fn use_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.middlewares.write().await.push(middleware);
    }

    fn rule_for(tool: &ToolDefinition) -> AuthorizationRule {
        AuthorizationRule {
            resource: tool.name.clone(),
            required_scopes: tool.required_scopes.clone(),
            predicate: tool.custom_auth_check.clone(),
        }
    }

    // --- session surface ---

    /// Create a session for `user_id` and mint a bearer token bound to
    /// it. `scope` defaults to `{read, write}`.
    pub async fn create_session(
        &self,
        user_id: &str,
        scope: Option<Vec<String>>,
        metadata: Option<HashMap<String, Value>>,
    ) -> anyhow::Result<SessionGrant> {
        let scope = scope.unwrap_or_else(default_scopes);
        let session = self.sessions.create_session(user_id, metadata).await;
        let token = self.authenticator.issue_token(
            user_id,
            &session.session_id.to_string(),
            Some(scope.clone()),
        )?;

        self.audit.log(
            AuditEntry::new(AuditAction::SessionCreated, AuditOutcome::Success)
                .with_user(user_id)
                .with_session(session.session_id)
                .with_meta_field("scope", scope.into()),
        );
        self.audit.log(
            AuditEntry::new(AuditAction::TokenIssued, AuditOutcome::Success)
                .with_user(user_id)
                .with_session(session.session_id),
        );

        Ok(SessionGrant {
            token,
            session_id: session.session_id,
        })
    }

    /// Destroy a session, invalidating every token bound to it.
    pub async fn destroy_session(&self, session_id: &SessionId) -> bool {
        let destroyed = self.sessions.destroy_session(session_id).await;
        if destroyed {
            self.audit.log(
                AuditEntry::new(AuditAction::SessionDestroyed, AuditOutcome::Success)
                    .with_session(session_id),
            );
        }
        destroyed
    }

    // --- protocol surface ---

    /// Tool discovery. No auth required, by design.
    pub async fn handle_list_tools(&self) -> Vec<ToolMetadata> {
        self.tools.read().await.values().map(ToolDefinition::metadata).collect()
    }

    /// The protocol-facing entry point for `tools/call`.
    pub async fn handle_call_tool(&self, request: Request) -> Response {
        let resource = request.tool_name().map(str::to_string);

        match self.process_tool_call(&request).await {
            Ok((result, ctx)) => {
                let mut entry = AuditEntry::new(AuditAction::ToolCall, AuditOutcome::Success)
                    .with_user(&ctx.user_id)
                    .with_session(ctx.session_id);
                if let Some(resource) = &resource {
                    entry = entry.with_resource(resource);
                }
                self.audit.log(entry);
                Response::success(render_tool_result(&result))
            }
            Err(failure) => {
                warn!(
                    resource = resource.as_deref().unwrap_or("<unresolved>"),
                    kind = failure.error.kind(),
                    "tool call rejected"
                );

                let mut entry =
                    AuditEntry::new(AuditAction::ToolCall, failure.error.audit_outcome())
                        .with_meta_field("kind", failure.error.kind().into());
                if let GatewayError::Handler(e) = &failure.error {
                    entry = entry.with_meta_field("error", e.to_string().into());
                }
                if let GatewayError::RateLimitExceeded { retry_after_ms } = &failure.error {
                    entry = entry.with_meta_field("retry_after_ms", (*retry_after_ms).into());
                }
                if let Some(user_id) = &failure.user_id {
                    entry = entry.with_user(user_id);
                }
                if let Some(session_id) = &failure.session_id {
                    entry = entry.with_session(session_id);
                }
                if let Some(resource) = &resource {
                    entry = entry.with_resource(resource);
                }
                self.audit.log(entry);
                Response::error(failure.error.to_mcp_error())
            }
        }
    }

    /// Steps 1–9. The order is normative; each step fails with its own
    /// kind and aborts the pass.
    async fn process_tool_call(
        &self,
        request: &Request,
    ) -> Result<(Value, AuthContext), CallFailure> {
        // 1. resolve tool
        let tool_name = request.tool_name().ok_or_else(|| {
            CallFailure::bare(GatewayError::ToolNotFound {
                tool_name: "<missing>".to_string(),
            })
        })?;
        let tool = self
            .tools
            .read()
            .await
            .get(tool_name)
            .cloned()
            .ok_or_else(|| {
                CallFailure::bare(GatewayError::ToolNotFound {
                    tool_name: tool_name.to_string(),
                })
            })?;

        // 2. extract token
        let token = request
            .token()
            .ok_or_else(|| CallFailure::bare(GatewayError::AuthRequired))?;

        // 3. verify token
        let claims = self
            .authenticator
            .verify_token(token)
            .map_err(|e| CallFailure::bare(e.into()))?;

        // 4. verify session
        let session_id = claims.parsed_session_id().ok_or_else(|| CallFailure {
            error: SessionError::NotFound.into(),
            user_id: Some(claims.user_id.clone()),
            session_id: Some(claims.session_id.clone()),
        })?;
        self.sessions
            .verify_session(&session_id)
            .await
            .map_err(|e| CallFailure {
                error: e.into(),
                user_id: Some(claims.user_id.clone()),
                session_id: Some(claims.session_id.clone()),
            })?;

        // 5. the per-request principal
        let ctx = claims.to_auth_context(session_id);

        // 6. rate limit, keyed by user
        let decision = self.rate_limiter.check_limit(&ctx.user_id);
        if !decision.allowed {
            return Err(CallFailure::identified(
                GatewayError::RateLimitExceeded {
                    retry_after_ms: decision.retry_after_ms(),
                },
                &ctx,
            ));
        }

        // 7. authorize, when the tool declares requirements
        if tool.requires_authorization() {
            // keep the rule in sync with the live definition
            self.verifier.add_rule(Self::rule_for(&tool));
            self.verifier
                .verify(&tool.name, &ctx)
                .map_err(|e| CallFailure::identified(e.into(), &ctx))?;
        }

        // 8. middleware chain
        let security_ctx = SecurityContext::new(
            ctx.clone(),
            Arc::clone(&self.vault) as Arc<dyn CredentialStore>,
        );
        let mut inner = Request {
            method: tool.name.clone(),
            params: request.arguments(),
            headers: request.headers.clone(),
        };
        let chain: Vec<Arc<dyn Middleware>> = self.middlewares.read().await.clone();
        for middleware in chain {
            match middleware.handle(inner, &security_ctx).await {
                MiddlewareVerdict::Continue(next) => inner = next,
                MiddlewareVerdict::Block => {
                    return Err(CallFailure::identified(
                        GatewayError::BlockedByMiddleware,
                        &ctx,
                    ));
                }
            }
        }

        // 9. invoke the handler
        let result = tool
            .handler
            .call(inner.params, security_ctx)
            .await
            .map_err(|e| CallFailure::identified(e.into(), &ctx))?;

        Ok((result, ctx))
    }

    // --- component handles for embedders ---

    pub fn vault(&self) -> Arc<TokenVault> {
        Arc::clone(&self.vault)
    }

    pub fn audit(&self) -> Arc<AuditLogger> {
        Arc::clone(&self.audit)
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn sessions(&self) -> Arc<SessionManager> {
        Arc::clone(&self.sessions)
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.rate_limiter)
    }

    pub fn verifier(&self) -> &RequestVerifier {
        &self.verifier
    }

    /// Shut the gateway down: cancel the sweepers and clear the session
    /// table. The vault and audit ring hold no unmanaged resources and
    /// are left as-is; closing the transport is the transport's job.
    pub async fn stop(&self) {
        self.sessions.destroy();
        self.rate_limiter.destroy();
        self.sessions.clear().await;
        info!(name = %self.name, "secure gateway stopped");
    }
}
