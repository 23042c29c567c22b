//! User lookup guarded by `user/<id>/read`.
use crate::api::types::{UserAuthorization, UserResponse};
use crate::auth::guard::Authorized;
use crate::model::UserProfile;
use axum::extract::Path;
use axum::{Extension, Json};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = String, Path, description = "Requested user identifier")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Policy denied read", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn get_user(
    Path(user_id): Path<String>,
    Extension(authorized): Extension<Authorized>,
) -> Json<UserResponse> {
    let principal = &authorized.session.principal;
    Json(UserResponse {
        message: "Access granted".to_string(),
        user: UserProfile::sample(&user_id),
        authorization: UserAuthorization {
            allowed: authorized.decision.allowed,
            current_user_id: principal.id.clone(),
            requested_user_id: user_id,
            role: authorized.session.role().to_string(),
        },
    })
}
