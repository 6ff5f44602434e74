//! Decision endpoints consumed by route guards and UI capability gates.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use crate::app::{dto::CheckResponse, errors, services::AppServices};
use crate::context::SubjectContext;

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub resource: String,
    pub action: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/access/check", get(check))
        .route("/access/explain", get(explain))
}

/// GET /access/check?resource=..&action=.. - allow/deny for the caller.
///
/// Unrecognized resource/action strings answer `allowed: false` (fail
/// closed); a store failure is an explicit 503, which guards also treat as
/// deny.
pub async fn check(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<AccessQuery>,
) -> axum::response::Response {
    match services
        .decide_raw(*ctx.subject(), query.resource, query.action)
        .await
    {
        Ok(allowed) => (StatusCode::OK, Json(CheckResponse { allowed })).into_response(),
        Err(err) => errors::decision_error_to_response(err),
    }
}

/// GET /access/explain?resource=..&action=.. - audit-grade decision trace
/// for the caller's own subject.
pub async fn explain(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SubjectContext>,
    Query(query): Query<AccessQuery>,
) -> axum::response::Response {
    let resource = match query.resource.parse() {
        Ok(r) => r,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let action = match query.action.parse() {
        Ok(a) => a,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.explain(*ctx.subject(), resource, action).await {
        Ok(explanation) => (StatusCode::OK, Json(explanation)).into_response(),
        Err(err) => errors::decision_error_to_response(err),
    }
}
