// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Settings the API layer needs at startup.
//!
//! The binary maps the file schema of `keygate-config` onto [`ApiConfig`];
//! tests build one directly with the `with_*` setters.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::TokenConfig;
use crate::error::{ApiError, ApiResult};
use crate::hasher::HasherConfig;

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "DELETE", "OPTIONS"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors: CorsConfig,
    pub token: TokenConfig,
    pub hashing: HasherConfig,
    /// Lets an unauthenticated caller register the first admin.
    pub allow_admin_bootstrap: bool,
    /// Whole-request deadline, e.g. `"30s"`.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Request body limit in bytes.
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            cors: CorsConfig::default(),
            token: TokenConfig::default(),
            hashing: HasherConfig::default(),
            allow_admin_bootstrap: true,
            request_timeout: Duration::from_secs(30),
            max_body_size: 1 << 20,
        }
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        (self.host, self.port).into()
    }

    pub fn with_host(self, host: IpAddr) -> Self {
        Self { host, ..self }
    }

    pub fn with_port(self, port: u16) -> Self {
        Self { port, ..self }
    }

    pub fn with_token(self, token: TokenConfig) -> Self {
        Self { token, ..self }
    }

    pub fn with_hashing(self, hashing: HasherConfig) -> Self {
        Self { hashing, ..self }
    }

    pub fn with_admin_bootstrap(self, allow_admin_bootstrap: bool) -> Self {
        Self {
            allow_admin_bootstrap,
            ..self
        }
    }

    /// Rejects settings the server cannot start with.
    ///
    /// The default config fails here: it has no signing secret.
    pub fn validate(&self) -> ApiResult<()> {
        self.token.validate()?;
        if let Err(e) = self.hashing.validate() {
            return Err(ApiError::internal(format!("hashing: {}", e)));
        }
        match (self.request_timeout.is_zero(), self.max_body_size) {
            (true, _) => Err(ApiError::internal("request_timeout is zero")),
            (_, 0) => Err(ApiError::internal("max_body_size is zero")),
            _ => Ok(()),
        }
    }
}

/// Cross-origin policy applied by the server's CORS layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins, or `"*"` for any.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allow_credentials: bool,
    /// Preflight cache lifetime in seconds.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_methods: METHODS.map(String::from).to_vec(),
            allow_credentials: false,
            max_age: 3600,
        }
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}
