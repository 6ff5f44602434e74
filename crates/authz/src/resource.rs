//! Protectable resources.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use ridgeline_core::DomainError;

/// A protectable functional area of the console.
///
/// Closed set: any string outside it is invalid. The `all` superuser scope
/// is deliberately **not** a variant here — it never names a protectable
/// area, it only keys the preset table (see [`crate::preset::RolePreset`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Projects,
    Opportunities,
    Properties,
    Users,
    Analytics,
    Documents,
    Financial,
    Marketing,
    Calendar,
    Messages,
    Reports,
    Settings,
}

impl Resource {
    /// Every resource, for exhaustive iteration (preset audits, tests).
    pub const ALL: [Resource; 12] = [
        Resource::Projects,
        Resource::Opportunities,
        Resource::Properties,
        Resource::Users,
        Resource::Analytics,
        Resource::Documents,
        Resource::Financial,
        Resource::Marketing,
        Resource::Calendar,
        Resource::Messages,
        Resource::Reports,
        Resource::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Projects => "projects",
            Resource::Opportunities => "opportunities",
            Resource::Properties => "properties",
            Resource::Users => "users",
            Resource::Analytics => "analytics",
            Resource::Documents => "documents",
            Resource::Financial => "financial",
            Resource::Marketing => "marketing",
            Resource::Calendar => "calendar",
            Resource::Messages => "messages",
            Resource::Reports => "reports",
            Resource::Settings => "settings",
        }
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projects" => Ok(Resource::Projects),
            "opportunities" => Ok(Resource::Opportunities),
            "properties" => Ok(Resource::Properties),
            "users" => Ok(Resource::Users),
            "analytics" => Ok(Resource::Analytics),
            "documents" => Ok(Resource::Documents),
            "financial" => Ok(Resource::Financial),
            "marketing" => Ok(Resource::Marketing),
            "calendar" => Ok(Resource::Calendar),
            "messages" => Ok(Resource::Messages),
            "reports" => Ok(Resource::Reports),
            "settings" => Ok(Resource::Settings),
            other => Err(DomainError::validation(format!("unknown resource: {other}"))),
        }
    }
}
