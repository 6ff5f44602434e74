//! Grant storage abstraction + in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use ridgeline_core::{DomainError, GrantId, UserId};

use crate::grant::{CreateGrant, PermissionGrant};

/// Grant store abstraction.
///
/// `create` and `revoke` touch a single row each; grants are additive and
/// independent, so no cross-row locking is required. Reads are safe for
/// unbounded concurrent callers.
pub trait GrantStore: Send + Sync {
    /// Validate and persist a new grant (`active = true`).
    ///
    /// Never merges with or deactivates pre-existing grants for the same
    /// (subject, resource); overlapping grants are legal and additive.
    fn create(
        &self,
        request: CreateGrant,
        now: DateTime<Utc>,
    ) -> Result<PermissionGrant, GrantStoreError>;

    /// Fetch one grant by id (audit lookup).
    fn get(&self, id: GrantId) -> Result<Option<PermissionGrant>, GrantStoreError>;

    /// Flip `active` to false. Idempotent on already-inactive grants; an
    /// unknown id is `NotFound` so operator mistakes surface.
    fn revoke(&self, id: GrantId) -> Result<(), GrantStoreError>;

    /// Full grant history for a subject, newest `issued_at` first.
    ///
    /// Includes inactive and expired rows; filtering for "currently
    /// effective" is the decision engine's job, not the listing's.
    fn list_for_subject(&self, subject: UserId) -> Result<Vec<PermissionGrant>, GrantStoreError>;

    /// Sweeper batch write: deactivate every active grant whose expiry has
    /// passed. Returns the number of rows touched. Idempotent.
    fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<usize, GrantStoreError>;
}

/// Grant store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GrantStoreError {
    #[error("grant not found: {0}")]
    NotFound(GrantId),

    #[error("{0}")]
    Validation(DomainError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<DomainError> for GrantStoreError {
    fn from(err: DomainError) -> Self {
        GrantStoreError::Validation(err)
    }
}

/// In-memory grant store for tests/dev.
///
/// Not optimized; listings scan the whole table.
#[derive(Debug, Default)]
pub struct InMemoryGrantStore {
    grants: RwLock<HashMap<GrantId, PermissionGrant>>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl GrantStore for InMemoryGrantStore {
    fn create(
        &self,
        request: CreateGrant,
        now: DateTime<Utc>,
    ) -> Result<PermissionGrant, GrantStoreError> {
        request.validate(now)?;
        let grant = request.into_grant(now);

        let mut grants = self
            .grants
            .write()
            .map_err(|_| GrantStoreError::Storage("lock poisoned".to_string()))?;
        grants.insert(grant.id, grant.clone());

        Ok(grant)
    }

    fn get(&self, id: GrantId) -> Result<Option<PermissionGrant>, GrantStoreError> {
        let grants = self
            .grants
            .read()
            .map_err(|_| GrantStoreError::Storage("lock poisoned".to_string()))?;
        Ok(grants.get(&id).cloned())
    }

    fn revoke(&self, id: GrantId) -> Result<(), GrantStoreError> {
        let mut grants = self
            .grants
            .write()
            .map_err(|_| GrantStoreError::Storage("lock poisoned".to_string()))?;

        match grants.get_mut(&id) {
            Some(grant) => {
                grant.revoke();
                Ok(())
            }
            None => Err(GrantStoreError::NotFound(id)),
        }
    }

    fn list_for_subject(&self, subject: UserId) -> Result<Vec<PermissionGrant>, GrantStoreError> {
        let grants = self
            .grants
            .read()
            .map_err(|_| GrantStoreError::Storage("lock poisoned".to_string()))?;

        let mut result: Vec<_> = grants
            .values()
            .filter(|g| g.subject == subject)
            .cloned()
            .collect();

        // Newest first; GrantId (UUIDv7) breaks ties deterministically.
        result.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then(b.id.cmp(&a.id)));

        Ok(result)
    }

    fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<usize, GrantStoreError> {
        let mut grants = self
            .grants
            .write()
            .map_err(|_| GrantStoreError::Storage("lock poisoned".to_string()))?;

        let mut touched = 0;
        for grant in grants.values_mut() {
            if grant.active && grant.is_expired_at(now) {
                grant.revoke();
                touched += 1;
            }
        }

        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::action::{Action, ActionSet};
    use crate::resource::Resource;

    fn create_request(
        subject: UserId,
        resource: Resource,
        expires_at: Option<DateTime<Utc>>,
    ) -> CreateGrant {
        CreateGrant {
            subject,
            resource,
            actions: ActionSet::of([Action::View]),
            issued_by: Some(UserId::new()),
            expires_at,
        }
    }

    #[test]
    fn create_persists_and_get_finds_it() {
        let store = InMemoryGrantStore::new();
        let now = Utc::now();
        let subject = UserId::new();

        let grant = store
            .create(create_request(subject, Resource::Projects, None), now)
            .unwrap();

        let found = store.get(grant.id).unwrap().unwrap();
        assert_eq!(found, grant);
        assert!(found.active);
    }

    #[test]
    fn invalid_request_persists_nothing() {
        let store = InMemoryGrantStore::new();
        let now = Utc::now();
        let subject = UserId::new();

        let mut request = create_request(subject, Resource::Projects, None);
        request.actions = ActionSet::new();

        let result = store.create(request, now);
        assert!(matches!(result, Err(GrantStoreError::Validation(_))));
        assert!(store.list_for_subject(subject).unwrap().is_empty());
    }

    #[test]
    fn revoke_twice_matches_revoke_once() {
        let store = InMemoryGrantStore::new();
        let now = Utc::now();
        let subject = UserId::new();

        let grant = store
            .create(create_request(subject, Resource::Documents, None), now)
            .unwrap();

        store.revoke(grant.id).unwrap();
        let once = store.get(grant.id).unwrap().unwrap();

        store.revoke(grant.id).unwrap();
        let twice = store.get(grant.id).unwrap().unwrap();

        assert_eq!(once, twice);
        assert!(!twice.active);
    }

    #[test]
    fn revoke_unknown_id_is_not_found() {
        let store = InMemoryGrantStore::new();
        let missing = GrantId::new();

        let result = store.revoke(missing);
        assert!(matches!(result, Err(GrantStoreError::NotFound(id)) if id == missing));
    }

    #[test]
    fn listing_is_newest_first_and_keeps_history() {
        let store = InMemoryGrantStore::new();
        let subject = UserId::new();
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(1);
        let t2 = t0 + Duration::minutes(2);

        let oldest = store
            .create(create_request(subject, Resource::Projects, None), t0)
            .unwrap();
        let middle = store
            .create(create_request(subject, Resource::Documents, None), t1)
            .unwrap();
        let newest = store
            .create(create_request(subject, Resource::Financial, None), t2)
            .unwrap();

        store.revoke(middle.id).unwrap();

        let listed = store.list_for_subject(subject).unwrap();
        let ids: Vec<_> = listed.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);

        // Revoked rows stay visible so audit history is complete.
        assert!(!listed[1].active);
    }

    #[test]
    fn listing_is_scoped_to_the_subject() {
        let store = InMemoryGrantStore::new();
        let now = Utc::now();
        let alice = UserId::new();
        let bob = UserId::new();

        store
            .create(create_request(alice, Resource::Projects, None), now)
            .unwrap();
        store
            .create(create_request(bob, Resource::Projects, None), now)
            .unwrap();

        assert_eq!(store.list_for_subject(alice).unwrap().len(), 1);
        assert_eq!(store.list_for_subject(bob).unwrap().len(), 1);
    }

    #[test]
    fn deactivate_expired_flips_only_due_rows_and_is_idempotent() {
        let store = InMemoryGrantStore::new();
        let subject = UserId::new();
        let t0 = Utc::now();

        let expiring = store
            .create(
                create_request(subject, Resource::Projects, Some(t0 + Duration::minutes(5))),
                t0,
            )
            .unwrap();
        let open_ended = store
            .create(create_request(subject, Resource::Documents, None), t0)
            .unwrap();

        let later = t0 + Duration::minutes(10);
        assert_eq!(store.deactivate_expired(later).unwrap(), 1);
        assert!(!store.get(expiring.id).unwrap().unwrap().active);
        assert!(store.get(open_ended.id).unwrap().unwrap().active);

        // Second pass over the same state touches nothing.
        assert_eq!(store.deactivate_expired(later).unwrap(), 0);
    }
}
