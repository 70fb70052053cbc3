// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request extractors.
//!
//! Every rejection is an [`ApiError`], so malformed input renders in the same
//! error body as handler failures.

use std::fmt::Display;
use std::str::FromStr;

use axum::{
    Json,
    body::Body,
    extract::{FromRequest, FromRequestParts, Path, Query},
    http::{Request, request::Parts},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::auth::IdentityContext;
use crate::error::ApiError;

/// Largest accepted `per_page` value.
pub const MAX_PER_PAGE: u32 = 100;

const DEFAULT_PER_PAGE: u32 = 20;

fn context_of(parts: &Parts) -> Option<IdentityContext> {
    parts.extensions.get::<IdentityContext>().copied()
}

// =============================================================================
// Identity
// =============================================================================

/// The caller's [`IdentityContext`], as attached by
/// [`AuthLayer`](crate::middleware::AuthLayer).
///
/// ```rust,ignore
/// async fn profile(Auth(ctx): Auth) -> String {
///     ctx.subject_id.to_string()
/// }
/// ```
pub struct Auth(pub IdentityContext);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context_of(parts)
            .map(Auth)
            .ok_or_else(|| ApiError::unauthenticated("no identity on request"))
    }
}

/// The caller's context on routes where credentials are optional.
pub struct OptionalAuth(pub Option<IdentityContext>);

impl<S: Send + Sync> FromRequestParts<S> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(context_of(parts)))
    }
}

// =============================================================================
// Body
// =============================================================================

/// JSON body whose decode failures become 400 `BAD_REQUEST`.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Validated page window of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    /// 1-based.
    pub page: u32,
    /// Records per page, at most [`MAX_PER_PAGE`].
    pub per_page: u32,
}

impl PaginationParams {
    /// Checks the bounds of a requested window.
    pub fn new(page: u32, per_page: u32) -> Result<Self, ApiError> {
        if page == 0 {
            return Err(ApiError::validation("page starts at 1"));
        }
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            return Err(ApiError::validation(format!(
                "per_page must be within 1..={}",
                MAX_PER_PAGE
            )));
        }
        Ok(Self { page, per_page })
    }

    /// Records skipped before this window.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.per_page as usize)
    }

    /// Records in this window.
    pub fn limit(&self) -> usize {
        self.per_page as usize
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Deserialize)]
struct PageQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

/// `?page=&per_page=` query, defaulting to the first page of 20.
pub struct Pagination(pub PaginationParams);

impl<S: Send + Sync> FromRequestParts<S> for Pagination {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<PageQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        let defaults = PaginationParams::default();
        PaginationParams::new(
            query.page.unwrap_or(defaults.page),
            query.per_page.unwrap_or(defaults.per_page),
        )
        .map(Pagination)
    }
}

// =============================================================================
// Path
// =============================================================================

/// Typed `{id}` path segment. An unparsable segment is a 400.
pub struct PathId<T>(pub T);

impl<S, T> FromRequestParts<S> for PathId<T>
where
    T: FromStr,
    T::Err: Display,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        match raw.parse() {
            Ok(id) => Ok(PathId(id)),
            Err(e) => Err(ApiError::bad_request(format!("bad id {:?}: {}", raw, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::model::IdentityId;

    fn parts(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_window_arithmetic() {
        let params = PaginationParams::new(3, 10).unwrap();
        assert_eq!(params.offset(), 20);
        assert_eq!(params.limit(), 10);
        assert_eq!(PaginationParams::default().offset(), 0);
    }

    #[test]
    fn test_window_bounds() {
        assert!(PaginationParams::new(1, MAX_PER_PAGE).is_ok());
        for (page, per_page) in [(0, 20), (1, 0), (1, MAX_PER_PAGE + 1)] {
            assert!(PaginationParams::new(page, per_page).is_err());
        }
    }

    #[tokio::test]
    async fn test_pagination_query() {
        let Pagination(params) = Pagination::from_request_parts(&mut parts("/?page=2"), &())
            .await
            .unwrap();
        assert_eq!(params, PaginationParams { page: 2, per_page: 20 });

        let rejected = Pagination::from_request_parts(&mut parts("/?per_page=500"), &()).await;
        assert!(matches!(rejected, Err(ApiError::Validation { .. })));

        let rejected = Pagination::from_request_parts(&mut parts("/?page=abc"), &()).await;
        assert!(matches!(rejected, Err(ApiError::BadRequest { .. })));
    }

    #[tokio::test]
    async fn test_auth_reads_context_extension() {
        let mut parts = parts("/");
        assert!(Auth::from_request_parts(&mut parts, &()).await.is_err());

        let ctx = IdentityContext::new(IdentityId::new(), Role::StandardUser);
        parts.extensions.insert(ctx);
        let Auth(found) = Auth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, ctx);
    }
}
