// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Request, StatusCode, header},
    routing::{MethodRouter, delete, get, post, put},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::{OperationPolicy, policies};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, PolicyLayer};
use crate::state::AppState;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Creates the router with all routes and middleware.
    ///
    /// Protected routes run [`AuthLayer`] first and then the [`PolicyLayer`]
    /// of their operation, so an unauthenticated request is rejected with 401
    /// before any policy is consulted.
    pub fn router(&self) -> Router {
        let codec = self.state.codec.clone();

        let public = Router::new()
            .route("/health", get(handlers::health))
            .route("/users/login", post(handlers::login))
            .route(
                "/users/register",
                post(handlers::register).route_layer(AuthLayer::new(codec.clone()).optional()),
            );

        let protected = Router::new()
            .route(
                "/users/profile",
                guarded(get(handlers::profile), &policies::VIEW_PROFILE),
            )
            .route(
                "/users",
                guarded(get(handlers::list_identities), &policies::LIST_IDENTITIES),
            )
            .route(
                "/users/{id}",
                guarded(get(handlers::get_identity), &policies::VIEW_IDENTITY)
                    .merge(guarded(put(handlers::update_identity), &policies::UPDATE_IDENTITY))
                    .merge(guarded(
                        delete(handlers::delete_identity),
                        &policies::DELETE_IDENTITY,
                    )),
            )
            .route(
                "/resources",
                guarded(post(handlers::create_resource), &policies::CREATE_RESOURCE)
                    .merge(guarded(get(handlers::list_resources), &policies::LIST_RESOURCES)),
            )
            .route(
                "/resources/{id}",
                guarded(get(handlers::get_resource), &policies::VIEW_RESOURCE)
                    .merge(guarded(put(handlers::update_resource), &policies::UPDATE_RESOURCE))
                    .merge(guarded(
                        delete(handlers::delete_resource),
                        &policies::DELETE_RESOURCE,
                    )),
            )
            .route_layer(AuthLayer::new(codec));

        let middleware_stack = ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %Uuid::now_v7(),
                        method = %req.method(),
                        uri = %req.uri(),
                        subject_id = tracing::field::Empty,
                    )
                }),
            )
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(create_cors_layer(&self.config));

        Router::new()
            .merge(public)
            .merge(protected)
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener until `shutdown_signal` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();

        match listener.local_addr() {
            Ok(addr) => info!("Starting API server on {}", addr),
            Err(_) => info!("Starting API server"),
        }

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Attaches the role predicate of `policy` to a method route.
fn guarded(
    route: MethodRouter<AppState>,
    policy: &'static OperationPolicy,
) -> MethodRouter<AppState> {
    route.route_layer(PolicyLayer::new(policy))
}

/// Creates the CORS layer from configuration.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .max_age(Duration::from_secs(cors.max_age))
        .allow_methods(methods)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if cors.allows_any_origin() {
        // Credentials cannot be combined with a wildcard origin.
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(cors.allow_credentials)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use crate::config::CorsConfig;
    use crate::hasher::HasherConfig;
    use tower::ServiceExt;

    fn test_server() -> ApiServer {
        let config = ApiConfig::default()
            .with_token(TokenConfig::new("test-secret-key-that-is-long-enough"))
            .with_hashing(HasherConfig::minimal());
        ApiServer::new(AppState::builder().config(config).build().unwrap())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_server_addr() {
        assert_eq!(test_server().addr().port(), 8080);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_server()
            .router()
            .oneshot(get_request("/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let router = test_server().router();
        for uri in ["/users", "/users/profile", "/resources"] {
            let response = router.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = test_server()
            .router()
            .oneshot(get_request("/nope"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layer_with_explicit_origins() {
        let mut config = ApiConfig::default();
        config.cors = CorsConfig {
            allowed_origins: vec!["https://app.example.com".to_string()],
            allow_credentials: true,
            ..CorsConfig::default()
        };
        let _layer = create_cors_layer(&config);
    }
}
