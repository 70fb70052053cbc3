// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: liveness check
//! - [`users`]: registration, login and identity management
//! - [`resources`]: resource CRUD

mod health;
pub mod resources;
pub mod users;

pub use health::health;
pub use resources::{
    create_resource, delete_resource, get_resource, list_resources, update_resource,
};
pub use users::{
    delete_identity, get_identity, list_identities, login, profile, register, update_identity,
};
