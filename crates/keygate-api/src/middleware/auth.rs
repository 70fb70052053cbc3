// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer token authentication middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tower::{Layer, Service};

use crate::auth::TokenCodec;
use crate::auth::pipeline::{authenticate, has_credential};

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for bearer token authentication.
///
/// Verifies the `Authorization` header and stores the resulting
/// [`IdentityContext`](crate::auth::IdentityContext) in the request
/// extensions. Requests that fail verification never reach the inner service.
#[derive(Clone)]
pub struct AuthLayer {
    codec: Arc<TokenCodec>,
    optional: bool,
}

impl AuthLayer {
    /// Creates a layer that requires a valid token.
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self {
            codec,
            optional: false,
        }
    }

    /// Lets requests without an `Authorization` header through anonymously.
    ///
    /// A header that is present must still verify.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            codec: self.codec.clone(),
            optional: self.optional,
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for bearer token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    codec: Arc<TokenCodec>,
    optional: bool,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
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

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let codec = self.codec.clone();
        let optional = self.optional;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if optional && !has_credential(req.headers()) {
                return inner.call(req).await;
            }

            match authenticate(req.headers(), &codec, Utc::now()) {
                Ok(ctx) => {
                    tracing::Span::current()
                        .record("subject_id", tracing::field::display(ctx.subject_id));
                    req.extensions_mut().insert(ctx);
                    inner.call(req).await
                }
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityContext, Role, TokenConfig};
    use crate::model::IdentityId;
    use axum::http::{StatusCode, header};
    use std::convert::Infallible;
    use tower::ServiceExt;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(TokenConfig::new("middleware-test-secret-long-enough!")).unwrap())
    }

    /// Answers 200 when a context is present and 204 otherwise.
    async fn probe(req: Request<Body>) -> Result<Response, Infallible> {
        let status = if req.extensions().get::<IdentityContext>().is_some() {
            StatusCode::OK
        } else {
            StatusCode::NO_CONTENT
        };
        Ok(status.into_response())
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_sets_context() {
        let codec = codec();
        let token = codec
            .issue(IdentityId::new(), Role::StandardUser, Utc::now())
            .unwrap();
        let service = AuthLayer::new(codec).layer(tower::service_fn(probe));

        let response = service
            .oneshot(request(Some(&format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_tokens_rejected() {
        let service = AuthLayer::new(codec()).layer(tower::service_fn(probe));

        for authorization in [None, Some("Bearer not-a-token"), Some("raw-token")] {
            let response = service
                .clone()
                .oneshot(request(authorization))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_optional_layer() {
        let service = AuthLayer::new(codec())
            .optional()
            .layer(tower::service_fn(probe));

        let anonymous = service.clone().oneshot(request(None)).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::NO_CONTENT);

        let forged = service
            .oneshot(request(Some("Bearer forged.token.value")))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);
    }
}
