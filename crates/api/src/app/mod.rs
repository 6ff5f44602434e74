//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: engine + store wiring shared by handlers
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use ridgeline_authz::AuthorizationEngine;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(engine: AuthorizationEngine) -> Router {
    let services = Arc::new(services::AppServices::new(engine));

    // Protected routes: require an authenticated subject context.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::identity_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
