//! Service wiring shared by handlers.
//!
//! The engine and its store are synchronous; the Postgres store additionally
//! bridges onto the runtime with `block_on`, which panics on a tokio worker
//! thread. Handlers therefore never call the engine directly: every call goes
//! through these async wrappers, which run the work on the blocking thread
//! pool via `tokio::task::spawn_blocking`. A failed blocking task surfaces as
//! a storage error (and so as undecidable for decisions), never as a panic.

use chrono::Utc;

use ridgeline_authz::{
    Action, AuthorizationEngine, CreateGrant, DecisionError, DecisionExplanation, GrantStoreError,
    PermissionGrant, Resource, Subject,
};
use ridgeline_core::{GrantId, UserId};

/// Application services handed to handlers via `Extension<Arc<AppServices>>`.
pub struct AppServices {
    engine: AuthorizationEngine,
}

impl AppServices {
    pub fn new(engine: AuthorizationEngine) -> Self {
        Self { engine }
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T, GrantStoreError>
    where
        F: FnOnce(AuthorizationEngine) -> T + Send + 'static,
        T: Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || f(engine))
            .await
            .map_err(|e| GrantStoreError::Storage(format!("blocking task failed: {e}")))
    }

    pub async fn decide(
        &self,
        subject: Subject,
        resource: Resource,
        action: Action,
    ) -> Result<bool, DecisionError> {
        self.run_blocking(move |engine| engine.decide(&subject, resource, action))
            .await
            .map_err(DecisionError::Undecidable)?
    }

    pub async fn decide_raw(
        &self,
        subject: Subject,
        resource: String,
        action: String,
    ) -> Result<bool, DecisionError> {
        self.run_blocking(move |engine| engine.decide_raw(&subject, &resource, &action))
            .await
            .map_err(DecisionError::Undecidable)?
    }

    pub async fn explain(
        &self,
        subject: Subject,
        resource: Resource,
        action: Action,
    ) -> Result<DecisionExplanation, DecisionError> {
        self.run_blocking(move |engine| engine.explain(&subject, resource, action))
            .await
            .map_err(DecisionError::Undecidable)?
    }

    pub async fn create_grant(
        &self,
        request: CreateGrant,
    ) -> Result<PermissionGrant, GrantStoreError> {
        self.run_blocking(move |engine| engine.store().create(request, Utc::now()))
            .await?
    }

    pub async fn revoke_grant(&self, id: GrantId) -> Result<(), GrantStoreError> {
        self.run_blocking(move |engine| engine.store().revoke(id))
            .await?
    }

    pub async fn list_grants_for_subject(
        &self,
        user: UserId,
    ) -> Result<Vec<PermissionGrant>, GrantStoreError> {
        self.run_blocking(move |engine| engine.store().list_for_subject(user))
            .await?
    }
}
