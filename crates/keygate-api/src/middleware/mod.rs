// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! The request pipeline is two layers, applied outermost first:
//!
//! - [`AuthLayer`]: credential extraction and token verification
//! - [`PolicyLayer`]: the role predicate of the route's operation

mod auth;
mod policy;

pub use auth::{AuthLayer, AuthMiddleware};
pub use policy::{PolicyLayer, PolicyMiddleware};
