use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;
use thiserror::Error;

use bookwell_core::DomainError;

/// Client-facing failure of an admin request.
///
/// Authorization failures only ever reach the client as `Redirect` or
/// `NotFound`; the internal failure kind stays in the logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("redirect to {0}")]
    Redirect(String),

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ApiError::Validation(msg),
            DomainError::InvariantViolation(msg) => ApiError::Invariant(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Redirect(location) => Redirect::to(&location).into_response(),
            ApiError::NotFound => not_found(),
            ApiError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::Invariant(msg) => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
            }
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        }
    }
}

/// The single not-found body. Missing, out-of-scope, and malformed ids all
/// render through here.
pub fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn redirect_is_see_other_with_location() {
        let res = ApiError::Redirect("/login".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(res.headers().get(LOCATION).unwrap(), "/login");
    }

    #[test]
    fn domain_errors_map_to_client_errors() {
        assert_eq!(
            ApiError::from(DomainError::validation("bad")),
            ApiError::Validation("bad".to_string())
        );
        assert_eq!(
            ApiError::from(DomainError::invariant("done")),
            ApiError::Invariant("done".to_string())
        );
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
