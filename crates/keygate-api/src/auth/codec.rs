// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token encoding and verification.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Claims, IdentityContext, Role};
use crate::error::{ApiError, ApiResult};
use crate::model::IdentityId;

/// Tokens are HMAC-SHA256 signed.
const ALGORITHM: Algorithm = Algorithm::HS256;

// =============================================================================
// AuthError
// =============================================================================

/// Reasons a presented token is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token could not be decoded into a claim set.
    #[error("token is malformed")]
    Malformed,
    /// The signature does not match the claims under the current secret.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// The token's validity window has ended.
    #[error("token has expired")]
    Expired,
}

impl AuthError {
    /// Returns a stable snake_case code for responses.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Malformed => "malformed",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
        }
    }
}

// =============================================================================
// TokenConfig
// =============================================================================

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Shared signing secret.
    #[serde(skip_serializing)]
    pub secret: String,
    /// Value of the `iss` claim; tokens from other issuers are rejected.
    pub issuer: String,
    /// Token lifetime in seconds.
    pub lifetime_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(), // Must be set by user
            issuer: "keygate".to_string(),
            lifetime_secs: 3600,
        }
    }
}

impl TokenConfig {
    /// Creates a new configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Sets the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the token lifetime.
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime_secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        if self.secret.is_empty() {
            return Err(ApiError::internal("Token secret is not configured"));
        }
        if self.lifetime_secs <= 0 {
            return Err(ApiError::internal("Token lifetime must be positive"));
        }
        if self.secret.len() < 32 {
            tracing::warn!("Token secret is shorter than recommended (32 bytes)");
        }
        Ok(())
    }
}

// =============================================================================
// TokenCodec
// =============================================================================

/// Issues and verifies bearer tokens.
///
/// The secret is fixed at construction. Replacing the codec with one built
/// from a different secret invalidates every token issued before.
#[derive(Clone)]
pub struct TokenCodec {
    config: Arc<TokenConfig>,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenCodec {
    /// Creates a new codec with the given configuration.
    pub fn new(config: TokenConfig) -> ApiResult<Self> {
        config.validate()?;

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        // Expiry is checked against the caller-supplied clock in `verify`.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

        Ok(Self {
            config: Arc::new(config),
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
            validation: Arc::new(validation),
        })
    }

    /// Issues a token for `subject` valid from `now` for the configured lifetime.
    pub fn issue(&self, subject: IdentityId, role: Role, now: DateTime<Utc>) -> ApiResult<String> {
        let claims = Claims::new(
            subject,
            role,
            &self.config.issuer,
            now,
            self.config.lifetime_secs,
        );

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Verifies `token` at instant `now` and returns the identity it carries.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<IdentityContext, AuthError> {
        let claims = self.decode(token)?;

        if claims.is_expired_at(now) {
            return Err(AuthError::Expired);
        }

        Ok(IdentityContext::new(claims.sub, claims.role))
    }

    /// Checks the signature and structure of `token` and returns its claims.
    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                _ => {
                    tracing::trace!(error = %e, "Token could not be decoded");
                    AuthError::Malformed
                }
            })
    }

    /// Returns the token lifetime in seconds.
    pub fn lifetime_secs(&self) -> i64 {
        self.config.lifetime_secs
    }

    /// Returns the configured issuer.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.config.issuer)
            .field("algorithm", &ALGORITHM)
            .field("lifetime_secs", &self.config.lifetime_secs)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
