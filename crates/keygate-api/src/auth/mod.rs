// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization.
//!
//! This module provides:
//! - The closed [`Role`] enumeration
//! - [`TokenCodec`]: signed, time-bounded bearer tokens
//! - [`IdentityContext`]: the request-scoped result of token verification
//! - [`policy`]: role and ownership decisions per operation
//! - [`pipeline`]: the fixed-order credential → context → policy chain

mod claims;
mod codec;
mod context;
pub mod pipeline;
pub mod policy;
mod role;

pub use claims::Claims;
pub use codec::{AuthError, TokenCodec, TokenConfig};
pub use context::IdentityContext;
pub use pipeline::{PipelineStage, authenticate, authorize};
pub use policy::{Denial, OperationPolicy, OwnershipTarget, RoleSet, policies};
pub use role::{Role, UnknownRole};
