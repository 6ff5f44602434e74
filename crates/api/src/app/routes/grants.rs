//! Administrative grant management.
//!
//! Guarded by the decision engine itself: issuing or revoking a grant
//! requires edit or approve authority over the `settings` or `users`
//! resource.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use ridgeline_authz::{Action, DecisionError, Resource, Subject};
use ridgeline_core::{GrantId, UserId};

use crate::app::{dto, errors, services::AppServices};
use crate::context::SubjectContext;

pub fn router() -> Router {
    Router::new()
        .route("/admin/grants", post(create).get(list))
        .route("/admin/grants/:id/revoke", post(revoke))
}

/// Grant-management authority: edit or approve on settings or users.
async fn authorize_grant_admin(
    services: &AppServices,
    subject: Subject,
) -> Result<(), axum::response::Response> {
    let checks = [
        (Resource::Settings, Action::Edit),
        (Resource::Settings, Action::Approve),
        (Resource::Users, Action::Edit),
        (Resource::Users, Action::Approve),
    ];

    for (resource, action) in checks {
        match services.decide(subject, resource, action).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(err @ DecisionError::Undecidable(_)) => {
                return Err(errors::decision_error_to_response(err));
            }
        }
    }

    Err(errors::json_error(
        StatusCode::FORBIDDEN,
        "forbidden",
        "grant management requires edit/approve on settings or users",
    ))
}

/// POST /admin/grants - issue a new permission grant.
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Json(body): Json<dto::CreateGrantRequest>,
) -> axum::response::Response {
    let subject = *ctx.subject();
    if let Err(resp) = authorize_grant_admin(&services, subject).await {
        return resp;
    }

    let request = match body.into_create(subject.user_id) {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.create_grant(request).await {
        Ok(grant) => {
            info!(
                grant_id = %grant.id,
                subject = %grant.subject,
                resource = %grant.resource,
                actions = %grant.actions,
                issued_by = %subject.user_id,
                "permission grant created"
            );
            (
                StatusCode::CREATED,
                Json(dto::GrantResponse::from(grant)),
            )
                .into_response()
        }
        Err(err) => errors::store_error_to_response(err),
    }
}

/// POST /admin/grants/:id/revoke - one-way deactivation (idempotent).
pub async fn revoke(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let subject = *ctx.subject();
    if let Err(resp) = authorize_grant_admin(&services, subject).await {
        return resp;
    }

    let id: GrantId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.revoke_grant(id).await {
        Ok(()) => {
            info!(grant_id = %id, revoked_by = %subject.user_id, "permission grant revoked");
            (
                StatusCode::OK,
                Json(serde_json::json!({ "status": "revoked" })),
            )
                .into_response()
        }
        Err(err) => errors::store_error_to_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListGrantsQuery {
    pub user: String,
    pub resource: Option<String>,
    /// When true, keep only grants that are currently effective (active and
    /// unexpired). History is returned otherwise.
    pub active: Option<bool>,
}

/// GET /admin/grants?user=..[&resource=..][&active=true] - grant history,
/// newest first.
pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<ListGrantsQuery>,
) -> axum::response::Response {
    let subject = *ctx.subject();
    if let Err(resp) = authorize_grant_admin(&services, subject).await {
        return resp;
    }

    let user: UserId = match query.user.parse() {
        Ok(user) => user,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let resource = match query.resource.as_deref().map(str::parse::<Resource>) {
        None => None,
        Some(Ok(resource)) => Some(resource),
        Some(Err(e)) => return errors::domain_error_to_response(e),
    };

    let grants = match services.list_grants_for_subject(user).await {
        Ok(grants) => grants,
        Err(err) => return errors::store_error_to_response(err),
    };

    let now = Utc::now();
    let grants: Vec<dto::GrantResponse> = grants
        .into_iter()
        .filter(|g| resource.is_none_or(|r| g.resource == r))
        .filter(|g| !query.active.unwrap_or(false) || g.is_live_at(now))
        .map(dto::GrantResponse::from)
        .collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({ "grants": grants })),
    )
        .into_response()
}
