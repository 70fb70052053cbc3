// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Assertion helpers for the response envelopes.

use axum::http::StatusCode;

use super::harness::TestResponse;

/// Asserts a success envelope with `status`.
#[track_caller]
pub fn assert_success(response: &TestResponse, status: StatusCode) {
    assert_eq!(
        response.status, status,
        "unexpected status, body: {}",
        response.body
    );
    if status != StatusCode::NO_CONTENT {
        assert_eq!(
            response.body["success"], true,
            "missing success flag: {}",
            response.body
        );
    }
}

/// Asserts an error envelope with `status` and `code`.
#[track_caller]
pub fn assert_error(response: &TestResponse, status: StatusCode, code: &str) {
    assert_eq!(
        response.status, status,
        "unexpected status, body: {}",
        response.body
    );
    assert_eq!(
        response.error_code(),
        Some(code),
        "unexpected error code, body: {}",
        response.body
    );
    assert!(
        response.body["error"]["message"].is_string(),
        "error message missing: {}",
        response.body
    );
}

/// Asserts a 401 response, the only outcome for any credential failure.
#[track_caller]
pub fn assert_unauthorized(response: &TestResponse) {
    assert_eq!(
        response.status,
        StatusCode::UNAUTHORIZED,
        "expected 401, body: {}",
        response.body
    );
    let code = response.error_code();
    assert!(
        matches!(code, Some("UNAUTHENTICATED") | Some("INVALID_TOKEN")),
        "unexpected error code {:?}",
        code
    );
}

/// Asserts a 403 FORBIDDEN response.
#[track_caller]
pub fn assert_forbidden(response: &TestResponse) {
    assert_error(response, StatusCode::FORBIDDEN, "FORBIDDEN");
}

/// Asserts a 404 NOT_FOUND response.
#[track_caller]
pub fn assert_not_found(response: &TestResponse) {
    assert_error(response, StatusCode::NOT_FOUND, "NOT_FOUND");
}

/// Asserts a successful login body carrying a bearer token.
#[track_caller]
pub fn assert_token_issued(response: &TestResponse) {
    assert_eq!(
        response.status,
        StatusCode::OK,
        "login failed: {}",
        response.body
    );
    assert!(
        response.body["token"].as_str().is_some_and(|t| !t.is_empty()),
        "token missing: {}",
        response.body
    );
    assert_eq!(response.body["token_type"], "Bearer");
}
