//! Authorization engine: the allow/deny decision contract.
//!
//! The kernel ([`decide_at`]) is a pure function over the preset registry,
//! the subject's grant rows and an explicit `now`; the service
//! ([`AuthorizationEngine`]) binds it to a [`GrantStore`] and to wall-clock
//! time. Route guards and UI capability gates consume the service; tests and
//! the explain endpoint lean on the kernel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use ridgeline_core::{GrantId, UserId};

use crate::action::{Action, ActionSet};
use crate::grant::PermissionGrant;
use crate::preset::PresetRegistry;
use crate::resource::Resource;
use crate::role::Role;
use crate::store::{GrantStore, GrantStoreError};

/// An authenticated caller, as supplied by the identity/session provider.
///
/// Authentication is an external collaborator this engine trusts as already
/// solved; nothing here re-verifies who the user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub user_id: UserId,
    pub role: Role,
}

impl Subject {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Decision failure.
///
/// `Undecidable` is the explicit signal for a store-layer failure during a
/// read: the caller must treat it as deny, never as allow.
#[derive(Debug, Clone, Error)]
pub enum DecisionError {
    #[error("authorization undecidable: {0}")]
    Undecidable(#[from] GrantStoreError),
}

/// Effective action set for (subject, resource) at `now`:
/// preset base ∪ union of live matching grants.
///
/// Does not include the superuser bypass, which is scoped to the `all`
/// pseudo-resource and checked separately (first) in [`decide_at`].
pub fn effective_actions_at(
    registry: &PresetRegistry,
    subject: &Subject,
    resource: Resource,
    grants: &[PermissionGrant],
    now: DateTime<Utc>,
) -> ActionSet {
    let mut effective = registry.preset_for(subject.role).actions_for(resource);

    for grant in grants {
        if grant.subject == subject.user_id && grant.resource == resource && grant.is_live_at(now) {
            effective.union_with(&grant.actions);
        }
    }

    effective
}

/// Pure decision kernel.
///
/// - No I/O
/// - No panics
/// - Deterministic for a given `now`
pub fn decide_at(
    registry: &PresetRegistry,
    subject: &Subject,
    resource: Resource,
    action: Action,
    grants: &[PermissionGrant],
    now: DateTime<Utc>,
) -> bool {
    // Superuser bypass first: `edit` on the `all` pseudo-scope is a blanket
    // allow. Checked before any resource lookup so resources added after the
    // preset was authored are covered without a registry update.
    if registry
        .preset_for(subject.role)
        .allows_all_scope(Action::Edit)
    {
        return true;
    }

    effective_actions_at(registry, subject, resource, grants, now).contains(action)
}

/// Decision service: preset registry + grant store.
///
/// `decide` is read-only and safe for unbounded concurrent callers; the
/// service holds no mutable state of its own.
#[derive(Clone)]
pub struct AuthorizationEngine {
    registry: Arc<PresetRegistry>,
    store: Arc<dyn GrantStore>,
}

impl AuthorizationEngine {
    pub fn new(registry: PresetRegistry, store: Arc<dyn GrantStore>) -> Self {
        Self {
            registry: Arc::new(registry),
            store,
        }
    }

    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn GrantStore> {
        &self.store
    }

    /// Allow/deny for (subject, resource, action) at wall-clock now.
    pub fn decide(
        &self,
        subject: &Subject,
        resource: Resource,
        action: Action,
    ) -> Result<bool, DecisionError> {
        self.decide_as_of(subject, resource, action, Utc::now())
    }

    /// Allow/deny at an explicit instant. Expiration is evaluated lazily
    /// here; correctness never depends on the sweeper having run.
    pub fn decide_as_of(
        &self,
        subject: &Subject,
        resource: Resource,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<bool, DecisionError> {
        let grants = self.store.list_for_subject(subject.user_id)?;
        Ok(decide_at(
            &self.registry,
            subject,
            resource,
            action,
            &grants,
            now,
        ))
    }

    /// `decide`, with any failure mapped to deny (fail-closed).
    ///
    /// Route guards that cannot surface a 503 use this; the undecidable
    /// condition is still recorded for audit.
    pub fn decide_or_deny(&self, subject: &Subject, resource: Resource, action: Action) -> bool {
        match self.decide(subject, resource, action) {
            Ok(allowed) => allowed,
            Err(err) => {
                warn!(
                    user_id = %subject.user_id,
                    resource = %resource,
                    action = %action,
                    error = %err,
                    "authorization undecidable; failing closed"
                );
                false
            }
        }
    }

    /// Decision over raw string input (query parameters, stored rows from an
    /// older schema version).
    ///
    /// An unrecognized resource or action never errors toward the caller: it
    /// emits an audit event and resolves to deny.
    pub fn decide_raw(
        &self,
        subject: &Subject,
        resource: &str,
        action: &str,
    ) -> Result<bool, DecisionError> {
        let Ok(resource) = resource.parse::<Resource>() else {
            warn!(
                user_id = %subject.user_id,
                input = resource,
                "unrecognized resource in authorization check; denying"
            );
            return Ok(false);
        };
        let Ok(action) = action.parse::<Action>() else {
            warn!(
                user_id = %subject.user_id,
                input = action,
                "unrecognized action in authorization check; denying"
            );
            return Ok(false);
        };

        self.decide(subject, resource, action)
    }

    /// Explain a decision for audit tooling: what was allowed or denied,
    /// and which preset entries / grants contributed.
    pub fn explain(
        &self,
        subject: &Subject,
        resource: Resource,
        action: Action,
    ) -> Result<DecisionExplanation, DecisionError> {
        let now = Utc::now();
        let grants = self.store.list_for_subject(subject.user_id)?;
        let preset = self.registry.preset_for(subject.role);

        let superuser = preset.allows_all_scope(Action::Edit);
        let preset_actions = preset.actions_for(resource);
        let contributing_grants: Vec<GrantId> = grants
            .iter()
            .filter(|g| g.resource == resource && g.is_live_at(now))
            .map(|g| g.id)
            .collect();
        let effective = effective_actions_at(&self.registry, subject, resource, &grants, now);

        let granted = superuser || effective.contains(action);
        let (reason, denial) = if superuser {
            (
                format!(
                    "role '{}' holds edit on the all scope (blanket allow)",
                    subject.role
                ),
                None,
            )
        } else if preset_actions.contains(action) {
            (
                format!("role '{}' preset grants {action} on {resource}", subject.role),
                None,
            )
        } else if granted {
            (
                format!("explicit grant adds {action} on {resource}"),
                None,
            )
        } else {
            (
                format!(
                    "neither role '{}' preset nor any live grant allows {action} on {resource}",
                    subject.role
                ),
                Some(DenialKind::MissingAction),
            )
        };

        Ok(DecisionExplanation {
            user_id: subject.user_id,
            role: subject.role,
            resource,
            action,
            granted,
            superuser,
            reason,
            preset_actions,
            effective_actions: effective,
            contributing_grants,
            denial,
            evaluated_at: now,
        })
    }
}

/// Detailed explanation of one authorization decision.
///
/// Answers "why was this request allowed/denied?" for audit screens.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionExplanation {
    pub user_id: UserId,
    pub role: Role,
    pub resource: Resource,
    pub action: Action,
    pub granted: bool,
    /// True when the role bypassed evaluation via the `all` scope.
    pub superuser: bool,
    pub reason: String,
    pub preset_actions: ActionSet,
    pub effective_actions: ActionSet,
    pub contributing_grants: Vec<GrantId>,
    pub denial: Option<DenialKind>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    MissingAction,
}
