// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # keygate-config
//!
//! Configuration management for the keygate API server.
//!
//! ## Quick Start
//!
//! ```no_run
//! use keygate_config::loader::load_config;
//!
//! let config = load_config("keygate.yaml").unwrap();
//! println!("Port: {}", config.server.port);
//! ```
//!
//! ## Example File
//!
//! ```yaml
//! server:
//!   bind_address: 0.0.0.0
//!   port: 8080
//!   request_timeout_secs: 30
//! security:
//!   allow_admin_bootstrap: true
//!   token:
//!     secret: "${KEYGATE_SECRET}"
//!     lifetime_secs: 3600
//!   hashing:
//!     memory_kib: 19456
//!     iterations: 2
//!     parallelism: 1
//! ```
//!
//! ## Environment Variables
//!
//! Values in config files can reference environment variables with
//! `${VAR}` or `${VAR:default}`. After parsing, these variables override
//! individual fields:
//!
//! ```text
//! KEYGATE_SERVER_HOST=127.0.0.1
//! KEYGATE_SERVER_PORT=9090
//! KEYGATE_TOKEN_SECRET=...
//! KEYGATE_TOKEN_LIFETIME_SECS=900
//! KEYGATE_ADMIN_BOOTSTRAP=false
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, load_config, load_config_str, render};
pub use schema::{
    CorsConfig, HashingSettings, KeygateConfig, SecretValue, SecurityConfig, ServerConfig,
    TokenSettings,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
