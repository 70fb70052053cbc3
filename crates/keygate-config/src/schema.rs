// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for keygate.
//!
//! # Schema Structure
//!
//! ```text
//! KeygateConfig
//! ├── server: ServerConfig
//! │   └── cors: CorsConfig
//! └── security: SecurityConfig
//!     ├── token: TokenSettings
//!     └── hashing: HashingSettings
//! ```

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize, Serializer};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default API port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// Default token issuer.
pub const DEFAULT_TOKEN_ISSUER: &str = "keygate";

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default maximum request body size (1MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Default Argon2 memory cost in KiB.
pub const DEFAULT_HASH_MEMORY_KIB: u32 = 19 * 1024;

/// Default Argon2 pass count.
pub const DEFAULT_HASH_ITERATIONS: u32 = 2;

/// Default Argon2 lane count.
pub const DEFAULT_HASH_PARALLELISM: u32 = 1;

// =============================================================================
// KeygateConfig
// =============================================================================

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeygateConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Token and credential settings.
    pub security: SecurityConfig,
}

impl KeygateConfig {
    /// Validates the whole configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_address: IpAddr,

    /// Port to bind. `0` picks a free port.
    pub port: u16,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// CORS settings.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "must be greater than 0",
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::validation(
                "server.max_body_size",
                "must be greater than 0",
            ));
        }
        self.cors.validate()
    }
}

/// CORS settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (use "*" for all).
    pub allowed_origins: Vec<String>,

    /// Allowed methods.
    pub allowed_methods: Vec<String>,

    /// Whether browsers may send credentials.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allow_credentials: false,
            max_age_secs: 3600,
        }
    }
}

impl CorsConfig {
    /// Validates the CORS configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let wildcard = self.allowed_origins.iter().any(|o| o == "*");
        if wildcard && self.allow_credentials {
            return Err(ConfigError::validation(
                "server.cors.allow_credentials",
                "cannot be combined with the \"*\" origin",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Token and credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Whether the first admin may register without an admin token.
    pub allow_admin_bootstrap: bool,

    /// Bearer token settings.
    pub token: TokenSettings,

    /// Credential hashing cost.
    pub hashing: HashingSettings,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allow_admin_bootstrap: true,
            token: TokenSettings::default(),
            hashing: HashingSettings::default(),
        }
    }
}

impl SecurityConfig {
    /// Validates the security configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.token.validate()?;
        self.hashing.validate()
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenSettings {
    /// Shared signing secret. Required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretValue>,

    /// Value of the `iss` claim.
    pub issuer: String,

    /// Token lifetime in seconds.
    pub lifetime_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: DEFAULT_TOKEN_ISSUER.to_string(),
            lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
        }
    }
}

impl TokenSettings {
    /// Validates the token settings.
    pub fn validate(&self) -> ConfigResult<()> {
        match &self.secret {
            None => return Err(ConfigError::missing_field("security.token.secret")),
            Some(secret) if secret.expose().is_empty() => {
                return Err(ConfigError::validation(
                    "security.token.secret",
                    "cannot be empty",
                ));
            }
            Some(_) => {}
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::validation(
                "security.token.issuer",
                "cannot be empty",
            ));
        }
        if self.lifetime_secs == 0 {
            return Err(ConfigError::validation(
                "security.token.lifetime_secs",
                "must be greater than 0",
            ));
        }
        if i64::try_from(self.lifetime_secs).is_err() {
            return Err(ConfigError::validation(
                "security.token.lifetime_secs",
                "is too large",
            ));
        }
        Ok(())
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashingSettings {
    /// Memory cost in KiB.
    pub memory_kib: u32,

    /// Number of passes.
    pub iterations: u32,

    /// Number of lanes.
    pub parallelism: u32,

    /// Maximum concurrent hash computations. Defaults to the CPU count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_HASH_MEMORY_KIB,
            iterations: DEFAULT_HASH_ITERATIONS,
            parallelism: DEFAULT_HASH_PARALLELISM,
            max_concurrent: None,
        }
    }
}

impl HashingSettings {
    /// Validates the hashing settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.iterations == 0 {
            return Err(ConfigError::validation(
                "security.hashing.iterations",
                "must be greater than 0",
            ));
        }
        if self.parallelism == 0 {
            return Err(ConfigError::validation(
                "security.hashing.parallelism",
                "must be greater than 0",
            ));
        }
        // Argon2 needs at least 8 KiB per lane.
        if u64::from(self.memory_kib) < 8 * u64::from(self.parallelism) {
            return Err(ConfigError::validation(
                "security.hashing.memory_kib",
                "must be at least 8 KiB per lane",
            ));
        }
        if self.max_concurrent == Some(0) {
            return Err(ConfigError::validation(
                "security.hashing.max_concurrent",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never prints its content.
///
/// Deserializes from a plain string. `Display`, `Debug` and `Serialize` all
/// produce `***`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret content.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "***")
    }
}

impl std::fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SecretValue").field(&"***").finish()
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> KeygateConfig {
        let mut config = KeygateConfig::default();
        config.security.token.secret = Some(SecretValue::new("a-secret-that-is-long-enough"));
        config
    }

    #[test]
    fn test_keygate_config_default() {
        let config = KeygateConfig::default();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.security.token.issuer, "keygate");
        assert!(config.security.allow_admin_bootstrap);
        assert!(config.security.token.secret.is_none());
    }

    #[test]
    fn test_default_requires_secret() {
        let result = KeygateConfig::default().validate();
        assert!(matches!(result, Err(ConfigError::MissingField { .. })));
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = valid_config();
        config.security.token.secret = Some(SecretValue::new(""));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = valid_config();
        config.security.token.lifetime_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.server.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.server.max_body_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hashing_validation() {
        let mut hashing = HashingSettings::default();
        assert!(hashing.validate().is_ok());

        hashing.parallelism = 4;
        hashing.memory_kib = 16;
        assert!(hashing.validate().is_err());

        hashing.memory_kib = 32;
        assert!(hashing.validate().is_ok());

        hashing.max_concurrent = Some(0);
        assert!(hashing.validate().is_err());
    }

    #[test]
    fn test_cors_wildcard_with_credentials_rejected() {
        let mut cors = CorsConfig::default();
        assert!(cors.validate().is_ok());

        cors.allow_credentials = true;
        assert!(cors.validate().is_err());

        cors.allowed_origins = vec!["https://app.example.com".to_string()];
        assert!(cors.validate().is_ok());
    }

    #[test]
    fn test_secret_value_redacted() {
        let secret = SecretValue::new("hunter2");
        assert_eq!(secret.to_string(), "***");
        assert!(!format!("{:?}", secret).contains("hunter2"));
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"***\"");
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<KeygateConfig, _> =
            serde_json::from_str(r#"{"server": {"prot": 9090}}"#);
        assert!(result.is_err());
    }
}
