// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! ## Test Categories
//!
//! - `test_load_*`: Loading each file format into a running application
//! - `test_env_*`: Placeholders and environment overrides
//! - `test_reject_*`: Configurations that must not start
//! - `test_runtime_*`: Binary runtime assembly from a file
//! - `test_command_*`: Subcommands driven through the parsed CLI

use std::collections::HashMap;
use std::io::Write;
use std::net::{IpAddr, Ipv4Addr};

use keygate_api::{AppState, TokenConfig};
use clap::Parser;
use keygate_bin::{Cli, RuntimeBuilder, api_config_from, commands};
use keygate_config::{ConfigError, ConfigLoader, KeygateConfig, load_config};
use keygate_tests::prelude::*;
use tempfile::NamedTempFile;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

fn loader_with_env(vars: &[(&str, &str)]) -> ConfigLoader {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new().with_env_lookup(move |name| vars.get(name).cloned())
}

fn app_from(config: &KeygateConfig) -> TestApp {
    let api = api_config_from(config).expect("Failed to map configuration");
    let state = AppState::builder()
        .config(api)
        .build()
        .expect("Failed to build state");
    TestApp::from_state(state)
}

// =============================================================================
// Loading
// =============================================================================

#[tokio::test]
async fn test_load_yaml_into_running_app() {
    init_test_logging();
    let file = write_config(".yaml", &ConfigFixtures::yaml());
    let config = loader_with_env(&[]).load(file.path()).unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.bind_address, IpAddr::V4(Ipv4Addr::LOCALHOST));
    assert_eq!(config.security.token.issuer, "keygate-it");
    assert_eq!(
        config.server.cors.allowed_origins,
        vec!["https://app.example.com".to_string()]
    );

    let app = app_from(&config);
    assert_eq!(app.state().codec().issuer(), "keygate-it");

    let admin = app.bootstrap_admin().await;
    let login = app.login(&admin.external_key, TEST_SECRET).await;
    assert_eq!(login.body["expires_in"], 600);

    let list = app.get("/users", admin.auth()).await;
    assert_success(&list, StatusCode::OK);
}

#[tokio::test]
async fn test_load_toml_with_bootstrap_disabled() {
    let file = write_config(".toml", &ConfigFixtures::toml());
    let config = loader_with_env(&[]).load(file.path()).unwrap();

    assert_eq!(config.server.port, 8181);
    assert!(!config.security.allow_admin_bootstrap);
    assert_eq!(config.security.token.lifetime_secs, 120);

    let app = app_from(&config);
    let response = app.register(RegistrationFixtures::admin("root"), None).await;
    assert_forbidden(&response);
}

#[tokio::test]
async fn test_load_json_uses_defaults() {
    let file = write_config(".json", &ConfigFixtures::json());
    let config = loader_with_env(&[]).load(file.path()).unwrap();

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.security.token.issuer, "keygate");
    assert_eq!(config.security.token.lifetime_secs, 3600);
    assert!(config.security.allow_admin_bootstrap);

    let api = api_config_from(&config).unwrap();
    assert_eq!(api.port, 7070);
    assert_eq!(api.hashing.memory_kib, 8);
}

#[tokio::test]
async fn test_load_tokens_not_portable_across_issuers() {
    let yaml = write_config(".yaml", &ConfigFixtures::yaml());
    let json = write_config(".json", &ConfigFixtures::json());

    // Same secret, different issuer.
    let first = app_from(&loader_with_env(&[]).load(yaml.path()).unwrap());
    let second = app_from(&loader_with_env(&[]).load(json.path()).unwrap());

    let admin = first.bootstrap_admin().await;
    let response = second.get("/users/profile", admin.auth()).await;
    assert_error(&response, StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

// =============================================================================
// Environment
// =============================================================================

#[test]
fn test_env_secret_override() {
    let file = write_config(".yaml", ConfigFixtures::yaml_without_secret());
    let config = loader_with_env(&[("KEYGATE_TOKEN_SECRET", TEST_TOKEN_SECRET)])
        .load(file.path())
        .unwrap();

    let api = api_config_from(&config).unwrap();
    assert_eq!(api.token.secret, TEST_TOKEN_SECRET);
}

#[test]
fn test_env_placeholder_with_default() {
    let content = r#"
security:
  token:
    secret: "${KEYGATE_IT_SECRET:placeholder-default-secret-0123456789}"
  hashing:
    memory_kib: 8
    iterations: 1
"#;
    let file = write_config(".yaml", content);

    let config = loader_with_env(&[]).load(file.path()).unwrap();
    assert_eq!(
        config.security.token.secret.as_ref().unwrap().expose(),
        "placeholder-default-secret-0123456789"
    );

    let config = loader_with_env(&[("KEYGATE_IT_SECRET", "from-the-environment-0123456789")])
        .load(file.path())
        .unwrap();
    assert_eq!(
        config.security.token.secret.as_ref().unwrap().expose(),
        "from-the-environment-0123456789"
    );
}

#[test]
fn test_env_placeholder_without_default_fails() {
    let content = "security:\n  token:\n    secret: \"${KEYGATE_IT_UNSET}\"\n";
    let file = write_config(".yaml", content);

    let result = loader_with_env(&[]).load(file.path());
    assert!(matches!(
        result,
        Err(ConfigError::EnvVarNotFound { ref name }) if name == "KEYGATE_IT_UNSET"
    ));
}

#[test]
fn test_env_server_overrides() {
    let file = write_config(".yaml", &ConfigFixtures::yaml());
    let config = loader_with_env(&[
        ("KEYGATE_SERVER_HOST", "0.0.0.0"),
        ("KEYGATE_SERVER_PORT", "9999"),
        ("KEYGATE_ADMIN_BOOTSTRAP", "off"),
    ])
    .load(file.path())
    .unwrap();

    assert_eq!(config.server.port, 9999);
    assert_eq!(config.server.bind_address, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert!(!config.security.allow_admin_bootstrap);
}

#[test]
fn test_env_invalid_override() {
    let file = write_config(".yaml", &ConfigFixtures::yaml());

    let result = loader_with_env(&[("KEYGATE_ADMIN_BOOTSTRAP", "maybe")]).load(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));

    let result = loader_with_env(&[("KEYGATE_SERVER_PORT", "70000")]).load(file.path());
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

#[test]
fn test_env_custom_prefix() {
    let file = write_config(".yaml", ConfigFixtures::yaml_without_secret());
    let config = loader_with_env(&[("GATE_TOKEN_SECRET", TEST_TOKEN_SECRET)])
        .with_env_prefix("GATE")
        .load(file.path())
        .unwrap();

    assert!(config.security.token.secret.is_some());
}

// =============================================================================
// Rejection
// =============================================================================

#[test]
fn test_reject_missing_secret() {
    let file = write_config(".yaml", ConfigFixtures::yaml_without_secret());

    let result = loader_with_env(&[]).load(file.path());
    assert!(matches!(
        result,
        Err(ConfigError::MissingField { ref field }) if field == "security.token.secret"
    ));
}

#[test]
fn test_reject_unknown_field() {
    let content = format!("{}\n[extra]\nkey = 1\n", ConfigFixtures::toml());
    let file = write_config(".toml", &content);

    let result = loader_with_env(&[]).load(file.path());
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn test_reject_wildcard_cors_with_credentials() {
    let content = format!(
        "server:\n  cors:\n    allowed_origins: [\"*\"]\n    allow_credentials: true\n\
         security:\n  token:\n    secret: \"{}\"\n",
        TEST_TOKEN_SECRET
    );
    let file = write_config(".yaml", &content);

    let result = loader_with_env(&[]).load(file.path());
    assert!(matches!(result, Err(ConfigError::Validation { .. })));
}

#[test]
fn test_reject_unsupported_extension() {
    let file = write_config(".ini", "port = 1");

    let result = loader_with_env(&[]).load(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
}

#[test]
fn test_reject_missing_file() {
    let dir = temp_test_dir("keygate-config");
    let result = load_config(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

// =============================================================================
// Runtime Assembly
// =============================================================================

#[test]
fn test_runtime_from_file_with_port_override() {
    let file = write_config(".yaml", &ConfigFixtures::yaml());

    let runtime = RuntimeBuilder::new()
        .config_path(file.path())
        .port(Some(0))
        .build()
        .unwrap();
    let state = runtime.build_state().unwrap();

    assert_eq!(state.config.port, 0);
    assert_eq!(state.config.token.lifetime_secs, 600);
    assert!(state.config.cors.allow_credentials);
}

#[test]
fn test_runtime_mapped_codec_matches_file_secret() {
    let file = write_config(".yaml", &ConfigFixtures::yaml());
    let config = loader_with_env(&[]).load(file.path()).unwrap();
    let state = app_from(&config).state().clone();

    let reference = keygate_api::TokenCodec::new(
        TokenConfig::new(TEST_TOKEN_SECRET).with_issuer("keygate-it"),
    )
    .unwrap();
    let subject = keygate_api::IdentityId::new();
    let token = reference
        .issue(subject, keygate_api::Role::StandardUser, chrono::Utc::now())
        .unwrap();

    let ctx = state.codec().verify(&token, chrono::Utc::now()).unwrap();
    assert_eq!(ctx.subject_id, subject);
}

// =============================================================================
// Subcommands
// =============================================================================

#[tokio::test]
async fn test_command_validate_accepts_file() {
    let file = write_config(".toml", &ConfigFixtures::toml());
    let path = file.path().to_str().unwrap();

    for format in ["text", "json", "toml"] {
        let cli = Cli::parse_from(["keygate", "validate", "-c", path, "--format", format]);
        commands::execute(cli).await.unwrap();
    }
}

#[tokio::test]
async fn test_command_validate_rejects_missing_secret() {
    let file = write_config(".yaml", ConfigFixtures::yaml_without_secret());
    let path = file.path().to_str().unwrap();

    let cli = Cli::parse_from(["keygate", "--log-format", "json", "validate", "-c", path]);
    let err = commands::execute(cli).await.unwrap_err();
    assert_eq!(err.exit_code(), keygate_bin::error::exit::CONFIG);
}
