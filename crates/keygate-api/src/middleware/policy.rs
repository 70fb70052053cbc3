// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Operation policy middleware.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::pipeline::authorize;
use crate::auth::{IdentityContext, OperationPolicy};
use crate::error::ApiError;

// =============================================================================
// PolicyLayer
// =============================================================================

/// Layer enforcing the role predicate of an operation.
///
/// Must run inside an [`AuthLayer`](super::AuthLayer). Ownership predicates
/// are left to the handler, which knows the target record.
#[derive(Clone, Copy)]
pub struct PolicyLayer {
    policy: &'static OperationPolicy,
}

impl PolicyLayer {
    /// Creates a layer for `policy`.
    pub fn new(policy: &'static OperationPolicy) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for PolicyLayer {
    type Service = PolicyMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PolicyMiddleware {
            inner,
            policy: self.policy,
        }
    }
}

// =============================================================================
// PolicyMiddleware
// =============================================================================

/// Middleware for operation policy enforcement.
#[derive(Clone)]
pub struct PolicyMiddleware<S> {
    inner: S,
    policy: &'static OperationPolicy,
}

impl<S> Service<Request<Body>> for PolicyMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let policy = self.policy;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(ctx) = req.extensions().get::<IdentityContext>().copied() else {
                tracing::warn!(operation = policy.name, "No identity context found, denying access");
                return Ok(ApiError::unauthenticated("Authentication required").into_response());
            };

            match authorize(ctx, policy) {
                Ok(_) => inner.call(req).await,
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
