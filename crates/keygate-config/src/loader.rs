// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing for keygate.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick the format from its extension
//! 2. Substitute `${VAR}` / `${VAR:default}` placeholders
//! 3. Parse into [`KeygateConfig`]
//! 4. Apply `KEYGATE_*` environment overrides
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! KEYGATE_SERVER_HOST=127.0.0.1
//! KEYGATE_SERVER_PORT=9090
//! KEYGATE_TOKEN_SECRET=...
//! KEYGATE_TOKEN_LIFETIME_SECS=900
//! KEYGATE_ADMIN_BOOTSTRAP=false
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{KeygateConfig, SecretValue};
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Looks up an environment variable by name.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader for keygate.
///
/// # Examples
///
/// ```no_run
/// use keygate_config::loader::ConfigLoader;
///
/// let loader = ConfigLoader::new();
/// let config = loader.load("keygate.yaml").unwrap();
/// ```
#[derive(Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether placeholders and overrides consult the environment.
    resolve_env_vars: bool,

    /// Source of environment values.
    env: EnvLookup,
}

impl ConfigLoader {
    /// Creates a new configuration loader reading the process environment.
    pub fn new() -> Self {
        Self {
            env_prefix: "KEYGATE".to_string(),
            resolve_env_vars: true,
            env: Arc::new(|name| std::env::var(name).ok()),
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Replaces the environment source.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(lookup);
        self
    }

    /// Loads configuration from a file.
    ///
    /// The file format is determined by the file extension:
    /// - `.yaml` or `.yml` - YAML format
    /// - `.toml` - TOML format
    /// - `.json` - JSON format
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<KeygateConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let format = ConfigFormat::from_path(path)?;
        let content = self.read_file(path)?;
        let content = self.resolve_placeholders(&content)?;

        let mut config = parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;

        self.finish(&mut config)?;

        info!("Configuration loaded successfully");
        debug!(
            bind = %config.server.bind_address,
            port = config.server.port,
            "Effective server address"
        );

        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(
        &self,
        content: &str,
        format: ConfigFormat,
    ) -> ConfigResult<KeygateConfig> {
        let content = self.resolve_placeholders(content)?;
        let mut config = parse_str(&content, format)?;
        self.finish(&mut config)?;
        Ok(config)
    }

    fn finish(&self, config: &mut KeygateConfig) -> ConfigResult<()> {
        if self.resolve_env_vars {
            self.apply_env_overrides(config)?;
        }
        config.validate()
    }

    /// Reads file content.
    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn resolve_placeholders(&self, content: &str) -> ConfigResult<String> {
        if self.resolve_env_vars {
            resolve_env_placeholders(content, |name| (self.env)(name))
        } else {
            Ok(content.to_string())
        }
    }

    fn var(&self, suffix: &str) -> (String, Option<String>) {
        let name = format!("{}_{}", self.env_prefix, suffix);
        let value = (self.env)(&name);
        (name, value)
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&self, config: &mut KeygateConfig) -> ConfigResult<()> {
        if let (name, Some(value)) = self.var("SERVER_HOST") {
            config.server.bind_address = parse_env(&name, &value, "expected an IP address")?;
        }
        if let (name, Some(value)) = self.var("SERVER_PORT") {
            config.server.port = parse_env(&name, &value, "expected valid port number")?;
        }
        if let (_, Some(value)) = self.var("TOKEN_SECRET") {
            config.security.token.secret = Some(SecretValue::new(value));
        }
        if let (name, Some(value)) = self.var("TOKEN_LIFETIME_SECS") {
            config.security.token.lifetime_secs =
                parse_env(&name, &value, "expected a number of seconds")?;
        }
        if let (name, Some(value)) = self.var("ADMIN_BOOTSTRAP") {
            config.security.allow_admin_bootstrap = parse_bool(&value)
                .ok_or_else(|| ConfigError::invalid_env_var(name, "expected a boolean"))?;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("env_prefix", &self.env_prefix)
            .field("resolve_env_vars", &self.resolve_env_vars)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Substitutes `${VAR}` and `${VAR:default}` placeholders.
///
/// An unset variable without a default is an error. An unterminated `${` is
/// kept as-is.
pub fn resolve_env_placeholders<F>(content: &str, lookup: F) -> ConfigResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return Ok(result);
        };

        let body = &after[..end];
        let (name, default) = match body.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (body, None),
        };

        match (lookup(name), default) {
            (Some(value), _) => result.push_str(&value),
            (None, Some(default)) => result.push_str(default),
            (None, None) => return Err(ConfigError::env_var_not_found(name)),
        }

        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

/// Parses a string to bool.
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Some(true),
        "false" | "0" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str, expected: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env_var(name, expected))
}

fn parse_str(content: &str, format: ConfigFormat) -> ConfigResult<KeygateConfig> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// YAML parsing through the config crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

/// Renders a configuration with secrets redacted.
///
/// Only TOML and JSON output are supported.
pub fn render(config: &KeygateConfig, format: ConfigFormat) -> ConfigResult<String> {
    match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)
            .map_err(|e| ConfigError::serialization(e.to_string())),
        ConfigFormat::Json => serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::serialization(e.to_string())),
        ConfigFormat::Yaml => Err(ConfigError::unsupported_format("yaml output")),
    }
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<KeygateConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<KeygateConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================
