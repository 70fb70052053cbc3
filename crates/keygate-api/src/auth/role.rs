// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The role assigned to an identity.
///
/// The set is closed: policy code matches on it exhaustively, so adding a
/// role forces every decision point to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every operation and record.
    Admin,
    /// Access to its own profile and resources.
    #[default]
    StandardUser,
}

impl Role {
    /// All roles, highest privilege first.
    pub const ALL: [Role; 2] = [Role::Admin, Role::StandardUser];

    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::StandardUser => "standard_user",
        }
    }

    /// Returns `true` for the admin role.
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "standard_user" => Ok(Role::StandardUser),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
