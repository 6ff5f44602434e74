use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use ridgeline_authz::{DecisionError, GrantStoreError};
use ridgeline_core::DomainError;

pub fn store_error_to_response(err: GrantStoreError) -> axum::response::Response {
    match err {
        GrantStoreError::NotFound(id) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("grant {id} not found"))
        }
        GrantStoreError::Validation(e) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
        }
        GrantStoreError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn decision_error_to_response(err: DecisionError) -> axum::response::Response {
    match err {
        // The caller must treat undecidable as deny; 503 makes the failure
        // explicit instead of smuggling a false "allowed: false".
        DecisionError::Undecidable(e) => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "undecidable",
            e.to_string(),
        ),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
