//! Request/response DTOs and JSON mapping helpers.
//!
//! Wire input is stringly-typed; everything parses against the closed
//! role/resource/action sets before it can reach the store or the engine,
//! so an out-of-set value (say a resource `"invoices"`) dies here as a
//! validation error and nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ridgeline_authz::{ActionSet, CreateGrant, PermissionGrant};
use ridgeline_core::{DomainError, UserId};

#[derive(Debug, Deserialize)]
pub struct CreateGrantRequest {
    pub subject: String,
    pub resource: String,
    pub actions: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateGrantRequest {
    /// Parse into a typed creation request; `issued_by` is the
    /// authenticated administrator, recorded for audit.
    pub fn into_create(self, issued_by: UserId) -> Result<CreateGrant, DomainError> {
        let subject: UserId = self.subject.parse()?;
        let resource = self.resource.parse()?;

        let mut actions = ActionSet::new();
        for action in &self.actions {
            actions.insert(action.parse()?);
        }

        Ok(CreateGrant {
            subject,
            resource,
            actions,
            issued_by: Some(issued_by),
            expires_at: self.expires_at,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct GrantResponse {
    pub id: String,
    pub subject: String,
    pub resource: String,
    pub actions: Vec<String>,
    pub issued_by: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl From<PermissionGrant> for GrantResponse {
    fn from(grant: PermissionGrant) -> Self {
        Self {
            id: grant.id.to_string(),
            subject: grant.subject.to_string(),
            resource: grant.resource.as_str().to_string(),
            actions: grant.actions.iter().map(|a| a.as_str().to_string()).collect(),
            issued_by: grant.issued_by.map(|u| u.to_string()),
            issued_at: grant.issued_at,
            expires_at: grant.expires_at,
            active: grant.active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
}
