//! Postgres-backed grant store.
//!
//! Grants are plain rows; there is no cross-row coordination because grants
//! are additive and independent. Revocation and the sweeper both converge on
//! the same terminal state (`active = false`) through idempotent single-row
//! updates, so a race between them needs no locking.
//!
//! ## Thread safety
//!
//! `PostgresGrantStore` is `Send + Sync`; all operations go through the SQLx
//! connection pool. The synchronous [`GrantStore`] trait is bridged onto the
//! current tokio runtime handle.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{instrument, warn};

use ridgeline_authz::{ActionSet, CreateGrant, GrantStore, GrantStoreError, PermissionGrant, Resource};
use ridgeline_core::{GrantId, UserId};

/// Schema for the grants table. Applied idempotently at startup.
///
/// Rows are never deleted; revocation and expiry sweeping only flip
/// `active`, so the audit trail stays complete.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS permission_grants (
    id          UUID PRIMARY KEY,
    subject     UUID NOT NULL,
    resource    TEXT NOT NULL,
    actions     JSONB NOT NULL,
    issued_by   UUID,
    issued_at   TIMESTAMPTZ NOT NULL,
    expires_at  TIMESTAMPTZ,
    active      BOOLEAN NOT NULL DEFAULT TRUE
);
CREATE INDEX IF NOT EXISTS idx_permission_grants_subject
    ON permission_grants (subject, issued_at DESC);
CREATE INDEX IF NOT EXISTS idx_permission_grants_expiry
    ON permission_grants (expires_at) WHERE active;
"#;

/// Postgres-backed [`GrantStore`].
#[derive(Debug, Clone)]
pub struct PostgresGrantStore {
    pool: Arc<PgPool>,
}

impl PostgresGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Apply the grants schema (idempotent).
    pub async fn ensure_schema(&self) -> Result<(), GrantStoreError> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement)
                .execute(self.pool.as_ref())
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(subject = %request.subject), err)]
    pub async fn create_grant(
        &self,
        request: CreateGrant,
        now: DateTime<Utc>,
    ) -> Result<PermissionGrant, GrantStoreError> {
        request.validate(now)?;
        let grant = request.into_grant(now);

        let actions = serde_json::to_value(&grant.actions)
            .map_err(|e| GrantStoreError::Storage(format!("serialize actions: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO permission_grants
                (id, subject, resource, actions, issued_by, issued_at, expires_at, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(*grant.id.as_uuid())
        .bind(*grant.subject.as_uuid())
        .bind(grant.resource.as_str())
        .bind(actions)
        .bind(grant.issued_by.map(|u| *u.as_uuid()))
        .bind(grant.issued_at)
        .bind(grant.expires_at)
        .bind(grant.active)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("create", e))?;

        Ok(grant)
    }

    pub async fn get_grant(&self, id: GrantId) -> Result<Option<PermissionGrant>, GrantStoreError> {
        let row = sqlx::query(
            "SELECT id, subject, resource, actions, issued_by, issued_at, expires_at, active
             FROM permission_grants WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        match row {
            Some(row) => Ok(Some(grant_from_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(grant_id = %id), err)]
    pub async fn revoke_grant(&self, id: GrantId) -> Result<(), GrantStoreError> {
        // Unconditional flag flip: revoking an already-inactive grant is a
        // no-op that still matches the row, which keeps revoke idempotent.
        let result = sqlx::query("UPDATE permission_grants SET active = FALSE WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| map_sqlx_error("revoke", e))?;

        if result.rows_affected() == 0 {
            return Err(GrantStoreError::NotFound(id));
        }
        Ok(())
    }

    pub async fn list_grants_for_subject(
        &self,
        subject: UserId,
    ) -> Result<Vec<PermissionGrant>, GrantStoreError> {
        let rows = sqlx::query(
            "SELECT id, subject, resource, actions, issued_by, issued_at, expires_at, active
             FROM permission_grants
             WHERE subject = $1
             ORDER BY issued_at DESC, id DESC",
        )
        .bind(*subject.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("list_for_subject", e))?;

        let mut grants = Vec::with_capacity(rows.len());
        for row in &rows {
            match grant_from_row(row) {
                Ok(grant) => grants.push(grant),
                // A row written by an older schema version may carry a
                // resource outside today's closed set. Fail closed: exclude
                // it from every decision and flag it for operators.
                Err(err) => warn!(error = %err, "skipping unreadable grant row"),
            }
        }

        Ok(grants)
    }

    pub async fn deactivate_expired_grants(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, GrantStoreError> {
        let result = sqlx::query(
            "UPDATE permission_grants
             SET active = FALSE
             WHERE active AND expires_at IS NOT NULL AND expires_at <= $1",
        )
        .bind(now)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| map_sqlx_error("deactivate_expired", e))?;

        Ok(result.rows_affected() as usize)
    }
}

impl GrantStore for PostgresGrantStore {
    fn create(
        &self,
        request: CreateGrant,
        now: DateTime<Utc>,
    ) -> Result<PermissionGrant, GrantStoreError> {
        runtime_handle()?.block_on(self.create_grant(request, now))
    }

    fn get(&self, id: GrantId) -> Result<Option<PermissionGrant>, GrantStoreError> {
        runtime_handle()?.block_on(self.get_grant(id))
    }

    fn revoke(&self, id: GrantId) -> Result<(), GrantStoreError> {
        runtime_handle()?.block_on(self.revoke_grant(id))
    }

    fn list_for_subject(&self, subject: UserId) -> Result<Vec<PermissionGrant>, GrantStoreError> {
        runtime_handle()?.block_on(self.list_grants_for_subject(subject))
    }

    fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<usize, GrantStoreError> {
        runtime_handle()?.block_on(self.deactivate_expired_grants(now))
    }
}

// The GrantStore trait is synchronous, but Postgres operations require async.
// Bridge through the current tokio runtime handle; callers must be on a
// blocking-capable context (the sweeper thread, spawn_blocking).
fn runtime_handle() -> Result<tokio::runtime::Handle, GrantStoreError> {
    tokio::runtime::Handle::try_current().map_err(|_| {
        GrantStoreError::Storage(
            "PostgresGrantStore requires a tokio runtime context".to_string(),
        )
    })
}

fn grant_from_row(row: &sqlx::postgres::PgRow) -> Result<PermissionGrant, GrantStoreError> {
    let id: uuid::Uuid = row.try_get("id").map_err(row_error)?;
    let subject: uuid::Uuid = row.try_get("subject").map_err(row_error)?;
    let resource: String = row.try_get("resource").map_err(row_error)?;
    let actions: serde_json::Value = row.try_get("actions").map_err(row_error)?;
    let issued_by: Option<uuid::Uuid> = row.try_get("issued_by").map_err(row_error)?;
    let issued_at: DateTime<Utc> = row.try_get("issued_at").map_err(row_error)?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(row_error)?;
    let active: bool = row.try_get("active").map_err(row_error)?;

    let resource = Resource::from_str(&resource)
        .map_err(|e| GrantStoreError::Storage(format!("grant {id}: {e}")))?;
    let actions: ActionSet = serde_json::from_value(actions)
        .map_err(|e| GrantStoreError::Storage(format!("grant {id}: bad action set: {e}")))?;

    Ok(PermissionGrant {
        id: GrantId::from_uuid(id),
        subject: UserId::from_uuid(subject),
        resource,
        actions,
        issued_by: issued_by.map(UserId::from_uuid),
        issued_at,
        expires_at,
        active,
    })
}

fn row_error(err: sqlx::Error) -> GrantStoreError {
    GrantStoreError::Storage(format!("row decode: {err}"))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> GrantStoreError {
    match err {
        sqlx::Error::Database(db_err) => GrantStoreError::Storage(format!(
            "database error in {}: {}",
            operation,
            db_err.message()
        )),
        sqlx::Error::PoolClosed => {
            GrantStoreError::Storage(format!("connection pool closed in {operation}"))
        }
        other => GrantStoreError::Storage(format!("sqlx error in {operation}: {other}")),
    }
}
