//! HTTP routes, one file per area.

use axum::Router;

pub mod access;
pub mod grants;
pub mod system;

/// All protected routes (identity middleware applied by the caller).
pub fn router() -> Router {
    Router::new()
        .merge(access::router())
        .merge(grants::router())
}
