// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identity handlers: registration, login and management.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::auth::Role;
use crate::credentials::{ProfileChanges, Registration};
use crate::error::ApiResult;
use crate::extractors::{Auth, JsonBody, OptionalAuth, Pagination, PathId};
use crate::model::{IdentityId, IdentityView};
use crate::response::{ApiResponse, TokenResponse};
use crate::state::AppState;

// =============================================================================
// Register
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Human-readable name.
    #[serde(alias = "name")]
    pub display_name: String,
    /// Login key.
    #[serde(alias = "key")]
    pub external_key: String,
    /// Plaintext secret.
    #[serde(alias = "password")]
    pub secret: String,
    /// Requested role.
    #[serde(default)]
    pub role: Option<Role>,
}

/// POST /users/register
///
/// Creates an identity. Setting `role` to `admin` needs an admin token,
/// except for the very first admin when bootstrap is enabled.
pub async fn register(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let identity = state
        .credentials()
        .register(
            Registration {
                display_name: request.display_name,
                external_key: request.external_key,
                secret: request.secret,
                role: request.role,
            },
            caller,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::success(IdentityView::from(identity)),
    ))
}

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login key.
    #[serde(alias = "key")]
    pub external_key: String,
    /// Plaintext secret.
    #[serde(alias = "password")]
    pub secret: String,
}

/// POST /users/login
///
/// Exchanges a key and secret for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let issued = state
        .credentials()
        .login(&request.external_key, &request.secret)
        .await?;

    Ok(Json(TokenResponse::bearer(issued.token, issued.expires_in)))
}

// =============================================================================
// Profile and listing
// =============================================================================

/// GET /users/profile
pub async fn profile(
    State(state): State<AppState>,
    Auth(ctx): Auth,
) -> ApiResult<impl IntoResponse> {
    let identity = state.credentials().profile(&ctx).await?;
    Ok(ApiResponse::success(IdentityView::from(identity)))
}

/// GET /users
pub async fn list_identities(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Pagination(pagination): Pagination,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .credentials()
        .list(&ctx, pagination.offset(), pagination.limit())
        .await?
        .map(IdentityView::from);

    Ok(ApiResponse::page(page.items, page.total, &pagination))
}

// =============================================================================
// Single identity
// =============================================================================

/// GET /users/{id}
pub async fn get_identity(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathId(id): PathId<IdentityId>,
) -> ApiResult<impl IntoResponse> {
    let identity = state.credentials().get(&ctx, id).await?;
    Ok(ApiResponse::success(IdentityView::from(identity)))
}

/// Identity update request body.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateIdentityRequest {
    /// New display name.
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
    /// New login key.
    #[serde(default, alias = "key")]
    pub external_key: Option<String>,
    /// New secret.
    #[serde(default, alias = "password")]
    pub secret: Option<String>,
    /// New role. Admin only.
    #[serde(default)]
    pub role: Option<Role>,
}

/// PUT /users/{id}
pub async fn update_identity(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathId(id): PathId<IdentityId>,
    JsonBody(request): JsonBody<UpdateIdentityRequest>,
) -> ApiResult<impl IntoResponse> {
    let identity = state
        .credentials()
        .update(
            &ctx,
            id,
            ProfileChanges {
                display_name: request.display_name,
                external_key: request.external_key,
                secret: request.secret,
                role: request.role,
            },
        )
        .await?;

    Ok(ApiResponse::success(IdentityView::from(identity)))
}

/// DELETE /users/{id}
pub async fn delete_identity(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathId(id): PathId<IdentityId>,
) -> ApiResult<impl IntoResponse> {
    state.credentials().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
