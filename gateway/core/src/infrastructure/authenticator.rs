// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Bearer token issue and verification.
//!
//! Tokens are compact JWTs signed with HMAC-SHA256 over the gateway's
//! configured secret. The library checks syntax and signature; issuer,
//! expiry, and payload shape are checked here, in that order, so each
//! failure maps to exactly one [`AuthError`] kind and a token that fails
//! several checks reports the earliest one.
//!
//! The authenticator is immutable after construction; the secret is
//! supplied by the embedding service and never rotated at runtime.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::principal::default_scopes;
use crate::domain::token::{AuthError, TokenClaims};

/// Claims as found on the wire, before shape checking. Every field is
/// optional so a foreign token fails with a typed kind instead of a
/// deserialization error.
#[derive(Debug, Serialize, Deserialize)]
struct RawClaims {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,
    #[serde(default)]
    scope: Option<Vec<String>>,
    #[serde(default)]
    iat: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    iss: Option<String>,
}

/// Authenticator construction options.
#[derive(Debug, Clone)]
pub struct AuthenticatorConfig {
    /// HMAC key for sign and verify.
    pub signing_secret: String,

    /// Value of the `iss` claim on issued tokens; verified tokens must
    /// match it exactly.
    pub issuer: String,

    /// `exp - iat` on issued tokens, in seconds.
    pub token_expiry_secs: i64,
}

/// Issues and verifies signed bearer tokens.
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    token_expiry_secs: i64,
}

impl Authenticator {
    pub fn new(config: AuthenticatorConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.signing_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.signing_secret.as_bytes()),
            issuer: config.issuer,
            token_expiry_secs: config.token_expiry_secs,
        }
    }

    /// Mint a token for `(user_id, session_id)`. `scope` defaults to
    /// `{read, write}`.
    pub fn issue_token(
        &self,
        user_id: &str,
        session_id: &str,
        scope: Option<Vec<String>>,
    ) -> anyhow::Result<String> {
        let iat = Utc::now().timestamp();
        self.sign(TokenClaims {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
            scope: scope.unwrap_or_else(default_scopes),
            iat,
            exp: iat + self.token_expiry_secs,
            iss: self.issuer.clone(),
        })
    }

    fn sign(&self, claims: TokenClaims) -> anyhow::Result<String> {
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a token end to end. On success the returned claims are
    /// fully populated and shape-checked.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // issuer and expiry are ordered manually below
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        let raw = jsonwebtoken::decode::<RawClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName => AuthError::BadSignature,
                _ => AuthError::Malformed,
            })?
            .claims;

        if raw.iss.as_deref() != Some(self.issuer.as_str()) {
            return Err(AuthError::WrongIssuer);
        }

        // a token without exp is treated as expired (fail closed)
        let exp = raw.exp.ok_or(AuthError::Expired)?;
        if Utc::now().timestamp() >= exp {
            return Err(AuthError::Expired);
        }

        let user_id = raw.user_id.filter(|s| !s.is_empty()).ok_or(AuthError::PayloadShape)?;
        let session_id = raw
            .session_id
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::PayloadShape)?;
        let scope = raw.scope.ok_or(AuthError::PayloadShape)?;

        Ok(TokenClaims {
            user_id,
            session_id,
            scope,
            iat: raw.iat.unwrap_or(0),
            exp,
            iss: self.issuer.clone(),
        })
    }

    /// Decode the claims segment without any verification. Diagnostics
    /// only. Never make an authorization decision from this.
    pub fn decode_token(&self, token: &str) -> Option<Value> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Verify, then re-issue with identical claims and fresh `iat`/`exp`.
    /// The scope is preserved verbatim, so refresh can never widen it.
    /// Returns `None` when the source token fails verification,
    /// including expiry.
    pub fn refresh_token(&self, token: &str) -> Option<String> {
        let claims = self.verify_token(token).ok()?;
        // a refresh within the same second still moves iat forward
        let iat = Utc::now().timestamp().max(claims.iat + 1);
        self.sign(TokenClaims {
            iat,
            exp: iat + self.token_expiry_secs,
            ..claims
        })
        .ok()
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }
}
