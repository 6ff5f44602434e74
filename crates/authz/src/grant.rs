//! Permission grants: explicit, time-bounded, revocable overrides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ridgeline_core::{DomainError, GrantId, UserId};

use crate::action::ActionSet;
use crate::resource::Resource;

/// An administrator-issued permission override for one user on one resource.
///
/// # Invariants
/// - An inactive grant is never considered, regardless of expiration.
/// - A past `expires_at` excludes the grant from decisions even while
///   `active` is still true; expiration is authoritative at read time,
///   independent of the sweeper.
/// - Grants are never physically deleted; revocation flips `active`
///   (audit trail preserved).
/// - Multiple grants may coexist for the same (subject, resource) pair;
///   their effects union.
///
/// The lifecycle is a one-way lattice: `Active(unexpired)` →
/// `Active(expired, lazily treated as revoked)` → `Revoked` (terminal).
/// "Expired" is a read-time classification, not a stored state, until the
/// sweeper catches up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub id: GrantId,
    pub subject: UserId,
    pub resource: Resource,
    pub actions: ActionSet,
    /// Issuing administrator, kept for audit; optional because grants
    /// migrated from the legacy console have no recorded issuer.
    pub issued_by: Option<UserId>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub active: bool,
}

impl PermissionGrant {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Active and unexpired: the only state in which a grant contributes
    /// to a decision.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired_at(now)
    }

    /// Revoke: one-way `active` → `false`. Idempotent by construction.
    pub fn revoke(&mut self) {
        self.active = false;
    }
}

/// Validated request to create a grant.
///
/// The closed `Resource`/`Action` types already exclude unknown values at
/// the type level; string input (HTTP, CLI, old rows) must parse before a
/// `CreateGrant` can exist. `validate` covers the remaining run-time rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateGrant {
    pub subject: UserId,
    pub resource: Resource,
    pub actions: ActionSet,
    pub issued_by: Option<UserId>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreateGrant {
    /// Synchronous create-time validation; nothing malformed is ever
    /// persisted.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.actions.is_empty() {
            return Err(DomainError::validation("grant must carry at least one action"));
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(DomainError::validation(
                    "expiry must be strictly in the future",
                ));
            }
        }
        Ok(())
    }

    /// Build the persistable grant. Call only after `validate`.
    pub fn into_grant(self, now: DateTime<Utc>) -> PermissionGrant {
        PermissionGrant {
            id: GrantId::new(),
            subject: self.subject,
            resource: self.resource,
            actions: self.actions,
            issued_by: self.issued_by,
            issued_at: now,
            expires_at: self.expires_at,
            active: true,
        }
    }
}
