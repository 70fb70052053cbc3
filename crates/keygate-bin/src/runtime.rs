// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! Maps the file configuration onto the API configuration, builds the
//! application state and serves until shutdown is signaled.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use keygate_api::{
    ApiConfig, ApiServer, AppState, CorsConfig as ApiCorsConfig, HasherConfig, TokenConfig,
};
use keygate_config::{HashingSettings, KeygateConfig, load_config};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// Configuration Mapping
// =============================================================================

/// Converts the file configuration into the API server configuration.
pub fn api_config_from(config: &KeygateConfig) -> BinResult<ApiConfig> {
    let token = &config.security.token;
    let secret = token
        .secret
        .as_ref()
        .map(|secret| secret.expose().to_string())
        .ok_or_else(|| BinError::config("security.token.secret is not set"))?;

    let server = &config.server;
    let mut api = ApiConfig::new()
        .with_host(server.bind_address)
        .with_port(server.port)
        .with_token(
            TokenConfig::new(secret)
                .with_issuer(token.issuer.clone())
                .with_lifetime(Duration::from_secs(token.lifetime_secs)),
        )
        .with_hashing(hasher_config_from(&config.security.hashing))
        .with_admin_bootstrap(config.security.allow_admin_bootstrap);

    api.request_timeout = server.request_timeout();
    api.max_body_size = server.max_body_size;
    api.cors = ApiCorsConfig {
        allowed_origins: server.cors.allowed_origins.clone(),
        allowed_methods: server.cors.allowed_methods.clone(),
        allow_credentials: server.cors.allow_credentials,
        max_age: server.cors.max_age_secs,
    };

    Ok(api)
}

/// Converts the file hashing settings into the hasher configuration.
pub fn hasher_config_from(hashing: &HashingSettings) -> HasherConfig {
    let config = HasherConfig {
        memory_kib: hashing.memory_kib,
        iterations: hashing.iterations,
        parallelism: hashing.parallelism,
        ..HasherConfig::default()
    };
    match hashing.max_concurrent {
        Some(max_concurrent) => config.with_max_concurrent(max_concurrent),
        None => config,
    }
}

// =============================================================================
// ServerRuntime
// =============================================================================

/// Runs the API server until shutdown.
pub struct ServerRuntime {
    config: Arc<KeygateConfig>,
    shutdown: ShutdownCoordinator,
    port_override: Option<u16>,
}

impl ServerRuntime {
    /// Creates a new runtime.
    pub fn new(config: KeygateConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            port_override: None,
        }
    }

    /// Overrides the configured port.
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port_override = port;
        self
    }

    /// Returns the shutdown coordinator driving this runtime.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Builds the application state from the configuration.
    pub fn build_state(&self) -> BinResult<AppState> {
        let mut api = api_config_from(&self.config)?;
        if let Some(port) = self.port_override {
            api.port = port;
        }

        AppState::builder()
            .config(api)
            .build()
            .map_err(|e| BinError::init(e.to_string()))
    }

    /// Serves until an OS signal or [`ShutdownCoordinator::initiate_shutdown`].
    pub async fn run(self) -> BinResult<()> {
        info!("Starting keygate v{}", keygate_api::VERSION);

        let state = self.build_state()?;
        let server = ApiServer::new(state);

        let watcher = {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move { shutdown.wait_for_shutdown().await })
        };

        let result = server
            .run_with_shutdown(self.shutdown.shutdown_signal())
            .await
            .map_err(BinError::from);

        watcher.abort();
        info!("keygate shutdown complete");

        result
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the server runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<KeygateConfig>,
    port: Option<u16>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: KeygateConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the configured port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<ServerRuntime> {
        let config = match self.config {
            Some(cfg) => cfg,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;

                load_config(&path).map_err(|e| {
                    BinError::from(e).with_context(format!(
                        "Failed to load config from {}",
                        path.display()
                    ))
                })?
            }
        };

        Ok(ServerRuntime::new(config).with_port(self.port))
    }
}

// =============================================================================
// Tests
// =============================================================================
