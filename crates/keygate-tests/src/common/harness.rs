// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-process application harness.
//!
//! [`TestApp`] drives the production router with `tower::ServiceExt::oneshot`,
//! so every request passes through the same middleware stack as a served
//! request without binding a socket.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use keygate_api::{ApiConfig, ApiServer, AppState};

use super::fixtures::{ApiFixtures, RegistrationFixtures, TEST_SECRET};

// =============================================================================
// TestResponse
// =============================================================================

/// A buffered response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response body as JSON, [`Value::Null`] when empty.
    pub body: Value,
}

impl TestResponse {
    /// Returns the `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// Returns the `meta` member of a success envelope.
    pub fn meta(&self) -> &Value {
        &self.body["meta"]
    }

    /// Returns the error code of an error envelope.
    pub fn error_code(&self) -> Option<&str> {
        self.body["error"]["code"].as_str()
    }
}

// =============================================================================
// TestUser
// =============================================================================

/// A registered identity with a live token.
#[derive(Debug, Clone)]
pub struct TestUser {
    /// Identity id.
    pub id: String,
    /// Login key.
    pub external_key: String,
    /// Bearer token from login.
    pub token: String,
}

impl TestUser {
    /// Returns the token as an option for request helpers.
    pub fn auth(&self) -> Option<&str> {
        Some(self.token.as_str())
    }
}

// =============================================================================
// TestApp
// =============================================================================

/// An application instance with its own stores.
#[derive(Clone)]
pub struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    /// Creates an application with the default fixture configuration.
    pub fn new() -> Self {
        Self::with_config(ApiFixtures::api_config())
    }

    /// Creates an application with `config`.
    pub fn with_config(config: ApiConfig) -> Self {
        let state = AppState::builder()
            .config(config)
            .build()
            .expect("Failed to build application state");
        Self::from_state(state)
    }

    /// Wraps an existing state.
    pub fn from_state(state: AppState) -> Self {
        let router = ApiServer::new(state.clone()).router();
        Self { state, router }
    }

    /// Returns the application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Sends a request with an optional bearer token and JSON body.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let authorization = token.map(|token| format!("Bearer {}", token));
        self.send(method, uri, authorization.as_deref(), body).await
    }

    /// Sends a request with a verbatim `Authorization` header.
    pub async fn request_with_authorization(
        &self,
        method: Method,
        uri: &str,
        authorization: &str,
    ) -> TestResponse {
        self.send(method, uri, Some(authorization), None).await
    }

    /// Sends a request with a raw, possibly malformed, body.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: &'static str,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder
            .body(Body::from(body))
            .expect("Failed to build request");
        self.dispatch(request).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("Failed to build request");
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse { status, body }
    }

    // =========================================================================
    // Shortcuts
    // =========================================================================

    /// GET `uri`.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    /// POST `body` to `uri`.
    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// PUT `body` to `uri`.
    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    /// DELETE `uri`.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// POST /users/register.
    pub async fn register(&self, body: Value, token: Option<&str>) -> TestResponse {
        self.post("/users/register", token, body).await
    }

    /// POST /users/login.
    pub async fn login(&self, external_key: &str, secret: &str) -> TestResponse {
        self.post(
            "/users/login",
            None,
            json!({ "external_key": external_key, "secret": secret }),
        )
        .await
    }

    /// Logs in and returns the token, panicking on failure.
    pub async fn login_token(&self, external_key: &str, secret: &str) -> String {
        let response = self.login(external_key, secret).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["token"]
            .as_str()
            .expect("token missing from login response")
            .to_string()
    }

    /// Registers the first admin through bootstrap and logs in.
    pub async fn bootstrap_admin(&self) -> TestUser {
        self.register_and_login(RegistrationFixtures::admin("root"), None)
            .await
    }

    /// Registers a standard user with `key` and logs in.
    pub async fn standard_user(&self, key: &str) -> TestUser {
        self.register_and_login(RegistrationFixtures::user(key), None)
            .await
    }

    async fn register_and_login(&self, body: Value, token: Option<&str>) -> TestUser {
        let response = self.register(body, token).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "registration failed: {}",
            response.body
        );

        let id = response.data()["id"]
            .as_str()
            .expect("id missing from registration")
            .to_string();
        let external_key = response.data()["external_key"]
            .as_str()
            .expect("external_key missing from registration")
            .to_string();
        let token = self.login_token(&external_key, TEST_SECRET).await;

        TestUser {
            id,
            external_key,
            token,
        }
    }

    /// Creates a resource owned by `owner` and returns its id.
    pub async fn create_resource(&self, owner: &TestUser, title: &str) -> String {
        let response = self
            .post(
                "/resources",
                owner.auth(),
                json!({ "title": title, "content": format!("{} body", title) }),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "resource creation failed: {}",
            response.body
        );
        response.data()["id"]
            .as_str()
            .expect("id missing from resource")
            .to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
