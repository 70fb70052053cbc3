// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Test fixtures.

use keygate_api::{ApiConfig, HasherConfig, TokenConfig};
use serde_json::{Value, json};

/// Signing secret shared by the fixture configurations.
pub const TEST_TOKEN_SECRET: &str = "integration-test-signing-secret-0123456789";

/// Secret used for every fixture identity.
pub const TEST_SECRET: &str = "correct-horse-battery";

// =============================================================================
// API Fixtures
// =============================================================================

/// Pre-built API configurations.
pub struct ApiFixtures;

impl ApiFixtures {
    /// Token configuration with the fixture secret.
    pub fn token_config() -> TokenConfig {
        TokenConfig::new(TEST_TOKEN_SECRET)
    }

    /// API configuration with cheap hashing and admin bootstrap enabled.
    pub fn api_config() -> ApiConfig {
        ApiConfig::default()
            .with_token(Self::token_config())
            .with_hashing(HasherConfig::minimal())
            .with_admin_bootstrap(true)
    }

    /// API configuration with admin bootstrap disabled.
    pub fn api_config_without_bootstrap() -> ApiConfig {
        Self::api_config().with_admin_bootstrap(false)
    }
}

// =============================================================================
// Registration Fixtures
// =============================================================================

/// Registration payloads.
pub struct RegistrationFixtures;

impl RegistrationFixtures {
    /// Standard user registration for `key`.
    pub fn user(key: &str) -> Value {
        json!({
            "display_name": format!("User {}", key),
            "external_key": key,
            "secret": TEST_SECRET,
        })
    }

    /// Admin registration for `key`.
    pub fn admin(key: &str) -> Value {
        json!({
            "display_name": format!("Admin {}", key),
            "external_key": key,
            "secret": TEST_SECRET,
            "role": "admin",
        })
    }
}

// =============================================================================
// Config File Fixtures
// =============================================================================

/// Configuration file contents.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// YAML configuration with cheap hashing.
    pub fn yaml() -> String {
        format!(
            r#"
server:
  bind_address: "127.0.0.1"
  port: 9090
  request_timeout_secs: 10
  cors:
    allowed_origins:
      - "https://app.example.com"
    allow_credentials: true

security:
  allow_admin_bootstrap: true
  token:
    secret: "{}"
    issuer: "keygate-it"
    lifetime_secs: 600
  hashing:
    memory_kib: 8
    iterations: 1
    parallelism: 1
    max_concurrent: 2
"#,
            TEST_TOKEN_SECRET
        )
    }

    /// TOML configuration with cheap hashing.
    pub fn toml() -> String {
        format!(
            r#"
[server]
bind_address = "0.0.0.0"
port = 8181

[security]
allow_admin_bootstrap = false

[security.token]
secret = "{}"
lifetime_secs = 120

[security.hashing]
memory_kib = 8
iterations = 1
parallelism = 1
"#,
            TEST_TOKEN_SECRET
        )
    }

    /// JSON configuration with cheap hashing.
    pub fn json() -> String {
        json!({
            "server": { "port": 7070 },
            "security": {
                "token": { "secret": TEST_TOKEN_SECRET },
                "hashing": { "memory_kib": 8, "iterations": 1, "parallelism": 1 }
            }
        })
        .to_string()
    }

    /// YAML configuration without a signing secret.
    pub fn yaml_without_secret() -> &'static str {
        r#"
server:
  port: 9090
security:
  hashing:
    memory_kib: 8
    iterations: 1
"#
    }
}
