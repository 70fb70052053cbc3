// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Resource handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::auth::policy::{self, OwnershipTarget};
use crate::auth::{IdentityContext, OperationPolicy, policies};
use crate::error::{ApiError, ApiResult, ValidationErrors};
use crate::extractors::{Auth, JsonBody, Pagination, PathId};
use crate::model::{NewResource, Resource, ResourceId, ResourceUpdate};
use crate::response::ApiResponse;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Resource creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    /// Short title.
    pub title: String,
    /// Free-form body.
    #[serde(default)]
    pub content: String,
}

/// Resource update request body. The owner cannot be changed.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateResourceRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New content.
    #[serde(default)]
    pub content: Option<String>,
}

fn check_title(errors: &mut ValidationErrors, title: &str) {
    if title.trim().is_empty() {
        errors.add("title", "must not be empty");
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// Loads resource `id` and evaluates `policy` against its owner.
///
/// A missing resource is a 404 before any ownership decision. A resource
/// whose owner was deleted is only reachable by admins.
async fn load_authorized(
    state: &AppState,
    ctx: &IdentityContext,
    id: ResourceId,
    policy: &OperationPolicy,
) -> ApiResult<Resource> {
    let resource = state
        .resources
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource"))?;

    let owner_exists = state.identities.exists(resource.owner_id).await?;
    let target = OwnershipTarget::with_owner_state(resource.owner_id, owner_exists);

    policy::evaluate(ctx, policy, Some(&target)).inspect_err(|denial| {
        tracing::warn!(
            subject_id = %ctx.subject_id,
            resource_id = %id,
            owner_exists,
            reason = %denial,
            "Resource access denied"
        );
    })?;

    Ok(resource)
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /resources
///
/// The caller becomes the owner.
pub async fn create_resource(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    JsonBody(request): JsonBody<CreateResourceRequest>,
) -> ApiResult<impl IntoResponse> {
    policy::evaluate(&ctx, &policies::CREATE_RESOURCE, None)?;

    let mut errors = ValidationErrors::new();
    check_title(&mut errors, &request.title);
    errors.into_result(())?;

    if !state.identities.exists(ctx.subject_id).await? {
        return Err(ApiError::not_found("Identity"));
    }

    let resource = state
        .resources
        .insert(NewResource {
            title: request.title,
            content: request.content,
            owner_id: ctx.subject_id,
        })
        .await?;

    Ok((StatusCode::CREATED, ApiResponse::success(resource)))
}

/// GET /resources
///
/// Admins see every resource, others only their own.
pub async fn list_resources(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    Pagination(pagination): Pagination,
) -> ApiResult<impl IntoResponse> {
    let owner = (!ctx.is_admin()).then_some(ctx.subject_id);
    let page = state
        .resources
        .list(owner, pagination.offset(), pagination.limit())
        .await?;

    Ok(ApiResponse::page(page.items, page.total, &pagination))
}

/// GET /resources/{id}
pub async fn get_resource(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathId(id): PathId<ResourceId>,
) -> ApiResult<impl IntoResponse> {
    let resource = load_authorized(&state, &ctx, id, &policies::VIEW_RESOURCE).await?;
    Ok(ApiResponse::success(resource))
}

/// PUT /resources/{id}
pub async fn update_resource(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathId(id): PathId<ResourceId>,
    JsonBody(request): JsonBody<UpdateResourceRequest>,
) -> ApiResult<impl IntoResponse> {
    load_authorized(&state, &ctx, id, &policies::UPDATE_RESOURCE).await?;

    let mut errors = ValidationErrors::new();
    if let Some(title) = &request.title {
        check_title(&mut errors, title);
    }
    errors.into_result(())?;

    let resource = state
        .resources
        .update(
            id,
            ResourceUpdate {
                title: request.title,
                content: request.content,
            },
        )
        .await?;

    tracing::info!(resource_id = %id, subject_id = %ctx.subject_id, "Resource updated");
    Ok(ApiResponse::success(resource))
}

/// DELETE /resources/{id}
pub async fn delete_resource(
    State(state): State<AppState>,
    Auth(ctx): Auth,
    PathId(id): PathId<ResourceId>,
) -> ApiResult<impl IntoResponse> {
    load_authorized(&state, &ctx, id, &policies::DELETE_RESOURCE).await?;

    if !state.resources.delete(id).await? {
        return Err(ApiError::not_found("Resource"));
    }
    Ok(StatusCode::NO_CONTENT)
}
