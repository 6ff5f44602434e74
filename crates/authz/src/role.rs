//! Organizational roles.
//!
//! Roles are a closed enumeration: an unknown role string is a
//! construction-time error, never a silent empty-permission fallback.
//! Genuinely dynamic input (HTTP parameters, rows written by an older
//! schema) goes through [`FromStr`] and fails closed at the boundary.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use ridgeline_core::DomainError;

/// Fixed organizational category assigned to a user.
///
/// A user's role is immutable at decision time; role changes happen in the
/// user-management subsystem, outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    ProjectManager,
    Investor,
    Client,
    Partner,
    Analyst,
}

impl Role {
    /// Every role, for exhaustive iteration (preset audits, tests).
    pub const ALL: [Role; 6] = [
        Role::Administrator,
        Role::ProjectManager,
        Role::Investor,
        Role::Client,
        Role::Partner,
        Role::Analyst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::ProjectManager => "project_manager",
            Role::Investor => "investor",
            Role::Client => "client",
            Role::Partner => "partner",
            Role::Analyst => "analyst",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrator" => Ok(Role::Administrator),
            "project_manager" => Ok(Role::ProjectManager),
            "investor" => Ok(Role::Investor),
            "client" => Ok(Role::Client),
            "partner" => Ok(Role::Partner),
            "analyst" => Ok(Role::Analyst),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}
