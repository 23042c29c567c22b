//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every route returns the
//! same `{ "error": <code>, "message": <text> }` shape.
//!
//! # Key invariants and assumptions
//! - `error` is a stable machine-readable code; `message` is human-readable.
//! - Status codes must align with the error category.
//! - Upstream failures never get a status of their own: they surface as the
//!   401/403 of the component that failed.
//!
//! # Security considerations
//! - Internal errors log details server-side but return generic messages.
//! - Upstream URLs and credentials never appear in response bodies.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

pub const CODE_INVALID_INPUT: &str = "invalid_input";
pub const CODE_UNAUTHENTICATED: &str = "unauthenticated";
pub const CODE_FORBIDDEN: &str = "forbidden";
pub const CODE_NOT_FOUND: &str = "not_found";
pub const CODE_INTERNAL: &str = "internal";

/// Structured API error returned by handlers and route layers.
///
/// # Invariants
/// - `status` must match the semantics of `body.error`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use gatekeeper::api::error::api_forbidden;
///
/// let err = api_forbidden("insufficient permissions");
/// assert_eq!(err.status, StatusCode::FORBIDDEN);
/// assert_eq!(err.body.error, "forbidden");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            error: code.to_string(),
            message: message.to_string(),
        },
    }
}

/// Build a 400 Bad Request error for malformed or incomplete input.
pub fn api_invalid_input(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, CODE_INVALID_INPUT, message)
}

/// Build a 401 error: the credential is missing or the session was rejected.
pub fn api_unauthenticated(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, CODE_UNAUTHENTICATED, message)
}

/// Build a 403 error: the session is valid but the policy denies the action.
pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, CODE_FORBIDDEN, message)
}

pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, CODE_NOT_FOUND, message)
}

/// Build a 500 error from an unexpected failure.
///
/// # What it does
/// Logs the error and returns a generic internal error response.
pub fn api_internal(message: &str, err: &dyn std::fmt::Display) -> ApiError {
    // Log internal details server-side; the client only sees `message`.
    tracing::error!(error = %err, "{message}");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, CODE_INTERNAL, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_helpers_build_expected_codes() {
        let invalid = api_invalid_input("bad");
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.body.error, CODE_INVALID_INPUT);

        let unauthenticated = api_unauthenticated("nope");
        assert_eq!(unauthenticated.status, StatusCode::UNAUTHORIZED);
        assert_eq!(unauthenticated.body.error, CODE_UNAUTHENTICATED);

        let forbidden = api_forbidden("nope");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.body.error, CODE_FORBIDDEN);

        let not_found = api_not_found("missing");
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.error, CODE_NOT_FOUND);
    }

    #[test]
    fn api_internal_hides_error_details() {
        let err = std::io::Error::other("connection refused to http://10.0.0.7");
        let api = api_internal("document store failed", &err);
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.body.error, CODE_INTERNAL);
        assert_eq!(api.body.message, "document store failed");
    }

    #[tokio::test]
    async fn error_body_serializes_stable_error_field() {
        let response = api_forbidden("denied").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(value["error"], "forbidden");
        assert_eq!(value["message"], "denied");
    }
}
