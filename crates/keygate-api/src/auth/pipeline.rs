// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request pipeline stages.
//!
//! Protected requests move through a fixed sequence:
//!
//! ```text
//! Unauthenticated -> CredentialExtracted -> TokenVerified -> Authorized -> Handled
//! ```
//!
//! A failure at any stage ends the request with that stage's error and no
//! later stage runs. The middleware layers in [`crate::middleware`] drive
//! these functions; they are exposed separately so the ordering can be
//! exercised without a router.

use std::fmt;

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};

use super::policy::{self, OperationPolicy};
use super::{AuthError, IdentityContext, TokenCodec};
use crate::error::{ApiError, ApiResult};

/// Authentication scheme accepted in the `Authorization` header.
const BEARER_SCHEME: &str = "Bearer";

/// Where a request currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    /// Nothing has been checked yet.
    Unauthenticated,
    /// A bearer credential was found in the request.
    CredentialExtracted,
    /// The credential verified into an identity context.
    TokenVerified,
    /// The role predicate of the operation passed.
    Authorized,
    /// The handler ran.
    Handled,
}

impl PipelineStage {
    /// Returns the stage name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Unauthenticated => "unauthenticated",
            PipelineStage::CredentialExtracted => "credential_extracted",
            PipelineStage::TokenVerified => "token_verified",
            PipelineStage::Authorized => "authorized",
            PipelineStage::Handled => "handled",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns `true` if the request carries an `Authorization` header at all.
pub fn has_credential(headers: &HeaderMap) -> bool {
    headers.contains_key(header::AUTHORIZATION)
}

/// Extracts the bearer token from the `Authorization` header.
///
/// A missing or non-UTF-8 header is [`ApiError::Unauthenticated`]. A header
/// that is present but not a single bearer token is [`AuthError::Malformed`].
pub fn extract_bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthenticated("No authorization token provided"))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthenticated("Authorization header is not valid UTF-8"))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(ApiError::invalid_token(AuthError::Malformed))?;

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(ApiError::invalid_token(AuthError::Malformed));
    }

    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(ApiError::invalid_token(AuthError::Malformed));
    }

    Ok(token)
}

/// Runs the credential extraction and token verification stages.
pub fn authenticate(
    headers: &HeaderMap,
    codec: &TokenCodec,
    now: DateTime<Utc>,
) -> ApiResult<IdentityContext> {
    let token = extract_bearer_token(headers).inspect_err(|e| {
        tracing::debug!(stage = %PipelineStage::Unauthenticated, error = %e, "No usable credential");
    })?;

    let ctx = codec.verify(token, now).map_err(|reason| {
        tracing::debug!(
            stage = %PipelineStage::CredentialExtracted,
            reason = reason.code(),
            "Token rejected"
        );
        ApiError::invalid_token(reason)
    })?;

    tracing::trace!(
        stage = %PipelineStage::TokenVerified,
        subject_id = %ctx.subject_id,
        role = %ctx.role,
        "Token verified"
    );

    Ok(ctx)
}

/// Runs the role stage of `policy` for an authenticated caller.
///
/// Ownership predicates need the target record and are evaluated by the
/// handler after lookup.
pub fn authorize(ctx: IdentityContext, policy: &OperationPolicy) -> ApiResult<IdentityContext> {
    match policy::check_role(&ctx, policy) {
        Ok(()) => {
            tracing::trace!(
                stage = %PipelineStage::Authorized,
                operation = policy.name,
                subject_id = %ctx.subject_id,
                "Operation authorized"
            );
            Ok(ctx)
        }
        Err(denial) => {
            tracing::warn!(
                subject_id = %ctx.subject_id,
                role = %ctx.role,
                operation = policy.name,
                "Permission denied"
            );
            Err(denial.into())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
