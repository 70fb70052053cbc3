// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Token claim set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;
use crate::model::IdentityId;

/// Claims embedded in a bearer token.
///
/// Timestamps are whole Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity the token was issued to.
    pub sub: IdentityId,

    /// Role of the subject at issue time.
    pub role: Role,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp). The token is invalid at and after this instant.
    pub exp: i64,

    /// Issuer.
    pub iss: String,

    /// Token ID.
    pub jti: String,
}

impl Claims {
    /// Creates claims issued at `now` and valid for `lifetime_secs`.
    pub fn new(
        subject: IdentityId,
        role: Role,
        issuer: impl Into<String>,
        now: DateTime<Utc>,
        lifetime_secs: i64,
    ) -> Self {
        let iat = now.timestamp();

        Self {
            sub: subject,
            role,
            iat,
            exp: iat.saturating_add(lifetime_secs),
            iss: issuer.into(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Returns `true` if the claims are expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    /// Returns the expiration time as a DateTime.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_claims_window() {
        let claims = Claims::new(IdentityId::new(), Role::Admin, "keygate", at(1_000), 60);

        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 1_060);
        assert!(!claims.is_expired_at(at(1_059)));
        assert!(claims.is_expired_at(at(1_060)));
        assert_eq!(claims.expires_at(), Some(at(1_060)));
    }

    #[test]
    fn test_claims_unique_token_ids() {
        let subject = IdentityId::new();
        let a = Claims::new(subject, Role::StandardUser, "keygate", at(0), 60);
        let b = Claims::new(subject, Role::StandardUser, "keygate", at(0), 60);
        assert_ne!(a.jti, b.jti);
    }
}
