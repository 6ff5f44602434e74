//! Identity middleware.
//!
//! The identity/session provider in front of this service authenticates the
//! caller and injects `x-user-id` / `x-user-role` headers; this middleware
//! trusts them and only translates them into a typed [`Subject`]. Malformed
//! or absent identity is 401 — the engine itself never sees an
//! unauthenticated request.

use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use ridgeline_authz::{Role, Subject};
use ridgeline_core::UserId;

use crate::context::SubjectContext;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

pub async fn identity_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let subject = extract_subject(req.headers())?;
    req.extensions_mut().insert(SubjectContext::new(subject));
    Ok(next.run(req).await)
}

fn extract_subject(headers: &HeaderMap) -> Result<Subject, StatusCode> {
    let user_id = header_str(headers, USER_ID_HEADER)?
        .parse::<UserId>()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    // An unknown role string is rejected here, not mapped to an empty
    // permission set: the role enumeration is closed.
    let role = header_str(headers, USER_ROLE_HEADER)?
        .parse::<Role>()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    Ok(Subject::new(user_id, role))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, StatusCode> {
    let value = headers
        .get(name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .trim();

    if value.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(value)
}
