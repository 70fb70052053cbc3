// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Authentication Integration Tests
//!
//! ## Test Categories
//!
//! - `test_e2e_*`: Registration through authorized access
//! - `test_credential_*`: Authorization header extraction
//! - `test_token_*`: Token verification failures
//! - `test_login_*`: Login outcomes
//! - `test_bootstrap_*`: First-admin bootstrap
//! - `test_elevation_*`: Self-elevation attempts

use chrono::{Duration, Utc};
use keygate_api::{IdentityId, Role, TokenCodec};
use keygate_tests::prelude::*;
use tokio::task::JoinSet;

// =============================================================================
// End-to-End
// =============================================================================

#[tokio::test]
async fn test_e2e_bootstrap_login_and_list() {
    init_test_logging();
    let app = TestApp::new();

    let registered = app.register(RegistrationFixtures::admin("root"), None).await;
    assert_success(&registered, StatusCode::CREATED);
    assert_eq!(registered.data()["role"], "admin");
    assert_eq!(registered.data()["external_key"], "root");
    assert!(registered.data().get("secret_digest").is_none());

    let login = app.login("root", TEST_SECRET).await;
    assert_token_issued(&login);
    assert_eq!(login.body["token_type"], "Bearer");
    assert_eq!(login.body["expires_in"], 3600);
    let token = login.body["token"].as_str().unwrap().to_string();

    let list = app.get("/users", Some(&token)).await;
    assert_success(&list, StatusCode::OK);
    assert_eq!(list.data().as_array().unwrap().len(), 1);
    assert_eq!(list.meta()["total"], 1);

    let anonymous = app.get("/users", None).await;
    assert_error(&anonymous, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_e2e_standard_user_profile() {
    let app = TestApp::new();
    let user = app.standard_user("alice").await;

    let profile = app.get("/users/profile", user.auth()).await;
    assert_success(&profile, StatusCode::OK);
    assert_eq!(profile.data()["id"], user.id.as_str());
    assert_eq!(profile.data()["role"], "standard_user");
    assert_eq!(profile.data()["display_name"], "User alice");
}

#[tokio::test]
async fn test_e2e_standard_user_cannot_list_identities() {
    let app = TestApp::new();
    app.bootstrap_admin().await;
    let user = app.standard_user("bob").await;

    let response = app.get("/users", user.auth()).await;
    assert_forbidden(&response);
}

#[tokio::test]
async fn test_e2e_field_aliases_accepted() {
    let app = TestApp::new();

    let registered = app
        .register(
            json!({ "name": "Carol", "key": "carol", "password": TEST_SECRET }),
            None,
        )
        .await;
    assert_success(&registered, StatusCode::CREATED);

    let login = app
        .post(
            "/users/login",
            None,
            json!({ "key": "carol", "password": TEST_SECRET }),
        )
        .await;
    assert_token_issued(&login);
}

#[tokio::test]
async fn test_e2e_deleted_identity_token_no_longer_resolves() {
    let app = TestApp::new();
    let admin = app.bootstrap_admin().await;
    let user = app.standard_user("dave").await;

    let deleted = app
        .delete(&format!("/users/{}", user.id), admin.auth())
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    // The token still verifies; the identity behind it is gone.
    let profile = app.get("/users/profile", user.auth()).await;
    assert_not_found(&profile);
}

// =============================================================================
// Credential Extraction
// =============================================================================

#[tokio::test]
async fn test_credential_missing_header() {
    let app = TestApp::new();
    for uri in ["/users/profile", "/users", "/resources"] {
        let response = app.get(uri, None).await;
        assert_error(&response, StatusCode::UNAUTHORIZED, "UNAUTHENTICATED");
    }
}

#[tokio::test]
async fn test_credential_malformed_headers() {
    let app = TestApp::new();
    let user = app.standard_user("erin").await;

    let cases = [
        user.token.clone(),
        format!("Basic {}", user.token),
        "Bearer".to_string(),
        format!("Bearer {} extra", user.token),
        "Bearer not-a-token".to_string(),
    ];

    for authorization in cases {
        let response = app
            .request_with_authorization(Method::GET, "/users/profile", &authorization)
            .await;
        assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    }
}

#[tokio::test]
async fn test_credential_scheme_is_case_insensitive() {
    let app = TestApp::new();
    let user = app.standard_user("frank").await;

    let response = app
        .request_with_authorization(
            Method::GET,
            "/users/profile",
            &format!("bearer {}", user.token),
        )
        .await;
    assert_success(&response, StatusCode::OK);
}

#[tokio::test]
async fn test_credential_rejected_before_policy() {
    let app = TestApp::new();

    // Even operations no standard user may perform answer 401 first.
    let response = app
        .request_with_authorization(Method::DELETE, "/users/whatever", "Bearer garbage")
        .await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

// =============================================================================
// Token Verification
// =============================================================================

#[tokio::test]
async fn test_token_signed_with_other_secret() {
    let app = TestApp::new();
    let user = app.standard_user("grace").await;
    let subject: IdentityId = user.id.parse().unwrap();

    let foreign = TokenCodec::new(keygate_api::TokenConfig::new(
        "a-completely-different-signing-secret",
    ))
    .unwrap();
    let token = foreign.issue(subject, Role::Admin, Utc::now()).unwrap();

    let response = app.get("/users", Some(&token)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    assert_eq!(response.body["error"]["details"]["reason"], "invalid_signature");
}

#[tokio::test]
async fn test_token_tampered_claims() {
    let app = TestApp::new();
    let user = app.standard_user("heidi").await;

    // Graft an admin claim set onto the user's signature.
    let subject: IdentityId = user.id.parse().unwrap();
    let forged = TokenCodec::new(keygate_api::TokenConfig::new("forger-secret-forger-secret"))
        .unwrap()
        .issue(subject, Role::Admin, Utc::now())
        .unwrap();

    let user_parts: Vec<&str> = user.token.split('.').collect();
    let forged_parts: Vec<&str> = forged.split('.').collect();
    let tampered = format!("{}.{}.{}", user_parts[0], forged_parts[1], user_parts[2]);

    let response = app.get("/users", Some(&tampered)).await;
    assert_unauthorized(&response);
}

#[tokio::test]
async fn test_token_expired() {
    let app = TestApp::new();
    let user = app.standard_user("ivan").await;
    let subject: IdentityId = user.id.parse().unwrap();

    let issued_at = Utc::now() - Duration::hours(2);
    let token = app
        .state()
        .codec()
        .issue(subject, Role::StandardUser, issued_at)
        .unwrap();

    let response = app.get("/users/profile", Some(&token)).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    assert_eq!(response.body["error"]["details"]["reason"], "expired");
}

#[tokio::test]
async fn test_token_role_is_taken_from_claims() {
    let app = TestApp::new();
    app.bootstrap_admin().await;
    let user = app.standard_user("judy").await;

    // A validly signed token issued with the admin role grants admin access.
    let subject: IdentityId = user.id.parse().unwrap();
    let token = app
        .state()
        .codec()
        .issue(subject, Role::Admin, Utc::now())
        .unwrap();

    let response = app.get("/users", Some(&token)).await;
    assert_success(&response, StatusCode::OK);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_wrong_secret() {
    let app = TestApp::new();
    app.standard_user("mallory").await;

    let response = app.login("mallory", "wrong-secret").await;
    assert_error(&response, StatusCode::BAD_REQUEST, "INVALID_CREDENTIAL");
}

#[tokio::test]
async fn test_login_unknown_key() {
    let app = TestApp::new();

    let response = app.login("nobody", TEST_SECRET).await;
    assert_not_found(&response);
}

#[tokio::test]
async fn test_login_missing_fields() {
    let app = TestApp::new();

    let response = app
        .post("/users/login", None, json!({ "external_key": "x" }))
        .await;
    assert_error(&response, StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

// =============================================================================
// Admin Bootstrap
// =============================================================================

#[tokio::test]
async fn test_bootstrap_only_first_admin() {
    let app = TestApp::new();
    app.bootstrap_admin().await;

    let second = app
        .register(RegistrationFixtures::admin("second-root"), None)
        .await;
    assert_forbidden(&second);
}

#[tokio::test]
async fn test_bootstrap_disabled() {
    let app = TestApp::with_config(ApiFixtures::api_config_without_bootstrap());

    let response = app.register(RegistrationFixtures::admin("root"), None).await;
    assert_forbidden(&response);

    let user = app.register(RegistrationFixtures::user("plain"), None).await;
    assert_success(&user, StatusCode::CREATED);
}

#[tokio::test]
async fn test_bootstrap_admin_registers_further_admins() {
    let app = TestApp::new();
    let admin = app.bootstrap_admin().await;

    let response = app
        .register(RegistrationFixtures::admin("deputy"), admin.auth())
        .await;
    assert_success(&response, StatusCode::CREATED);
    assert_eq!(response.data()["role"], "admin");
}

#[tokio::test]
async fn test_bootstrap_concurrent_attempts() {
    let app = TestApp::new();
    let mut tasks = JoinSet::new();

    for i in 0..6 {
        let app = app.clone();
        tasks.spawn(async move {
            app.register(RegistrationFixtures::admin(&format!("root-{}", i)), None)
                .await
                .status
        });
    }

    let mut created = 0;
    let mut forbidden = 0;
    while let Some(status) = tasks.join_next().await {
        match status.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::FORBIDDEN => forbidden += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(forbidden, 5);
}

// =============================================================================
// Self-Elevation
// =============================================================================

#[tokio::test]
async fn test_elevation_register_with_user_token() {
    let app = TestApp::new();
    app.bootstrap_admin().await;
    let user = app.standard_user("oscar").await;

    let response = app
        .register(RegistrationFixtures::admin("oscar-admin"), user.auth())
        .await;
    assert_forbidden(&response);
}

#[tokio::test]
async fn test_elevation_update_own_role() {
    let app = TestApp::new();
    app.bootstrap_admin().await;
    let user = app.standard_user("peggy").await;
    let uri = format!("/users/{}", user.id);

    let response = app.put(&uri, user.auth(), json!({ "role": "admin" })).await;
    assert_forbidden(&response);

    let profile = app.get("/users/profile", user.auth()).await;
    assert_eq!(profile.data()["role"], "standard_user");

    // Restating the current role is not an elevation.
    let same = app
        .put(&uri, user.auth(), json!({ "role": "standard_user" }))
        .await;
    assert_success(&same, StatusCode::OK);
}

#[tokio::test]
async fn test_elevation_admin_promotes_user() {
    let app = TestApp::new();
    let admin = app.bootstrap_admin().await;
    let user = app.standard_user("trent").await;

    let response = app
        .put(
            &format!("/users/{}", user.id),
            admin.auth(),
            json!({ "role": "admin" }),
        )
        .await;
    assert_success(&response, StatusCode::OK);
    assert_eq!(response.data()["role"], "admin");

    // The old token still carries the old role until re-login.
    let stale = app.get("/users", user.auth()).await;
    assert_forbidden(&stale);

    let token = app.login_token("trent", TEST_SECRET).await;
    let fresh = app.get("/users", Some(&token)).await;
    assert_success(&fresh, StatusCode::OK);
}
