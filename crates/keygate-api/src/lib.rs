// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # keygate-api
//!
//! HTTP API with bearer-token authentication and role/ownership
//! authorization over two record types: identities and the resources they
//! own.
//!
//! The request pipeline is:
//!
//! 1. [`middleware::AuthLayer`] extracts the bearer credential and verifies it
//!    with the [`auth::TokenCodec`] into an [`auth::IdentityContext`].
//! 2. [`middleware::PolicyLayer`] applies the role predicate of the route's
//!    [`auth::OperationPolicy`].
//! 3. The handler looks up its target and, for owner-gated operations, runs
//!    [`auth::policy::evaluate`] with the target's owner.
//!
//! Each stage ends the request on failure with its own [`ApiError`].

#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod credentials;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod hasher;
pub mod middleware;
pub mod model;
pub mod response;
pub mod server;
pub mod state;
pub mod store;

pub use auth::{AuthError, IdentityContext, Role, TokenCodec, TokenConfig};
pub use config::{ApiConfig, CorsConfig};
pub use credentials::{CredentialService, IssuedToken, ProfileChanges, Registration};
pub use error::{ApiError, ApiResult};
pub use hasher::{CredentialHasher, HashError, HasherConfig};
pub use model::{Identity, IdentityId, IdentityView, Resource, ResourceId};
pub use server::ApiServer;
pub use state::{AppState, AppStateBuilder};
pub use store::{IdentityStore, MemoryIdentityStore, MemoryResourceStore, ResourceStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
