//! Fixed API resources guarded by the policy gate.
//!
//! Both handlers run only after the guard resolved the session and received an
//! explicit allow for `api/protected-endpoint` (read) or `api/admin-endpoint`
//! (write).
use crate::api::types::{AccessResponse, SessionUser};
use crate::auth::guard::Authorized;
use axum::{Extension, Json};

fn access(authorized: Authorized, message: &str) -> Json<AccessResponse> {
    let principal = authorized.session.principal;
    Json(AccessResponse {
        success: true,
        message: message.to_string(),
        user: SessionUser {
            email: principal.email().map(str::to_string),
            roles: principal.roles.iter().cloned().collect(),
            id: principal.id,
        },
    })
}

#[utoipa::path(
    get,
    path = "/api/protected",
    tag = "resources",
    responses(
        (status = 200, description = "Access granted", body = AccessResponse),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Policy denied read", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn protected(Extension(authorized): Extension<Authorized>) -> Json<AccessResponse> {
    access(authorized, "Access granted to protected resource")
}

#[utoipa::path(
    post,
    path = "/api/admin",
    tag = "resources",
    responses(
        (status = 200, description = "Admin access granted", body = AccessResponse),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Policy denied write", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn admin(Extension(authorized): Extension<Authorized>) -> Json<AccessResponse> {
    access(authorized, "Admin access granted")
}
