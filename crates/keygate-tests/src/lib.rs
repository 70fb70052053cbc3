// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # keygate Integration Tests
//!
//! End-to-end tests that drive the full keygate router, the configuration
//! loader and the binary's configuration mapping together.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built configurations and registration payloads
//!   - `harness`: In-process application harness over the router
//!   - `assertions`: Assertion helpers for the JSON envelopes
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p keygate-tests
//!
//! # Run specific test suite
//! cargo test -p keygate-tests --test integration_auth
//! cargo test -p keygate-tests --test integration_api
//! cargo test -p keygate-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Auth Tests (`integration_auth.rs`)
//! - Registration, login and token issuance
//! - Credential extraction and token rejection
//! - Admin bootstrap and self-elevation
//!
//! ### API Tests (`integration_api.rs`)
//! - Identity management
//! - Resource ownership and orphaned resources
//! - Pagination and request validation
//!
//! ### Config Tests (`integration_config.rs`)
//! - Loading YAML, TOML and JSON files
//! - Environment placeholders and overrides
//! - Mapping file configuration onto a running application

pub mod common;

/// Commonly used items for the integration tests.
pub mod prelude {
    pub use crate::common::*;
    pub use axum::http::{Method, StatusCode};
    pub use serde_json::{Value, json};
}
