//! Account endpoints: login, signup with role, and session introspection.
//!
//! # Purpose
//! Forwards credentials to the session service and issues sessions whose
//! payload carries the caller's roles. None of these routes consult the
//! authorization gate.
//!
//! # Security considerations
//! - Passwords are forwarded as-is and never logged.
//! - Upstream failures on login surface as 401 without detail.
use crate::api::error::{ApiError, api_internal, api_invalid_input, api_unauthenticated};
use crate::api::types::{
    CredentialsRequest, LoginResponse, LoginSession, SessionInfo, SessionUser, SignupRequest,
    SignupResponse, SignupUser,
};
use crate::app::AppState;
use crate::auth::credential::session_cookie;
use crate::auth::guard::Authenticated;
use crate::auth::principal::DEFAULT_ROLE;
use crate::auth::session::{IssuedSession, SessionError};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, header};
use axum::{Extension, Json};

type CookieHeader = [(header::HeaderName, HeaderValue); 1];

fn cookie_header(state: &AppState, issued: &IssuedSession) -> Result<CookieHeader, ApiError> {
    let value = HeaderValue::from_str(&session_cookie(
        &state.credentials.cookie_name,
        &issued.access_token,
    ))
    .map_err(|err| api_internal("failed to build session cookie", &err))?;
    Ok([(header::SET_COOKIE, value)])
}

fn require_credentials(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(api_invalid_input("email and password required"));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "account",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Session created", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(CookieHeader, Json<LoginResponse>), ApiError> {
    let Json(request) = payload.map_err(|_| api_invalid_input("invalid JSON body"))?;
    require_credentials(&request.email, &request.password)?;

    let user = state
        .issuer
        .sign_in(&request.email, &request.password)
        .await
        .map_err(|err| {
            tracing::info!(error = %err, "sign-in rejected");
            api_unauthenticated("invalid credentials")
        })?;

    let roles = match state.issuer.user_roles(&user.id).await {
        Ok(roles) if !roles.is_empty() => roles,
        Ok(_) => vec![DEFAULT_ROLE.to_string()],
        Err(err) => {
            tracing::warn!(error = %err, user_id = %user.id, "role lookup failed; using default role");
            vec![DEFAULT_ROLE.to_string()]
        }
    };

    let issued = state
        .issuer
        .create_session(&user, &roles)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %user.id, "session creation failed");
            api_unauthenticated("unable to create session")
        })?;
    tracing::info!(user_id = %user.id, "session created");

    let cookie = cookie_header(&state, &issued)?;
    Ok((
        cookie,
        Json(LoginResponse {
            success: true,
            session: LoginSession {
                session_token: issued.access_token,
                handle: issued.handle,
                user: SessionUser {
                    id: user.id,
                    email: Some(user.email),
                    roles,
                },
            },
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/auth/signup-with-role",
    tag = "account",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "User created and session issued", body = SignupResponse),
        (status = 400, description = "Missing credentials or signup refused", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Session service unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn signup_with_role(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(CookieHeader, Json<SignupResponse>), ApiError> {
    let Json(request) = payload.map_err(|_| api_invalid_input("invalid JSON body"))?;
    require_credentials(&request.email, &request.password)?;
    let role = request
        .role
        .as_deref()
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .unwrap_or(DEFAULT_ROLE)
        .to_string();

    let user = state
        .issuer
        .sign_up(&request.email, &request.password)
        .await
        .map_err(|err| match err {
            // e.g. EMAIL_ALREADY_EXISTS_ERROR
            SessionError::Rejected(status) => api_invalid_input(&status),
            other => {
                tracing::warn!(error = %other, "sign-up failed");
                api_unauthenticated("session service unavailable")
            }
        })?;

    state
        .issuer
        .assign_role(&user.id, &role)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %user.id, "role assignment failed");
            api_unauthenticated("unable to assign role")
        })?;

    let issued = state
        .issuer
        .create_session(&user, std::slice::from_ref(&role))
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, user_id = %user.id, "session creation failed");
            api_unauthenticated("unable to create session")
        })?;
    tracing::info!(user_id = %user.id, role = %role, "user signed up");

    let cookie = cookie_header(&state, &issued)?;
    Ok((
        cookie,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user: SignupUser {
                id: user.id,
                email: user.email,
                role,
            },
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/session-info",
    tag = "account",
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn session_info(
    Extension(Authenticated(session)): Extension<Authenticated>,
) -> Json<SessionInfo> {
    let role = session.role().to_string();
    let principal = session.principal;
    Json(SessionInfo {
        role,
        roles: principal.roles.iter().cloned().collect(),
        user_id: principal.id,
        session_handle: session.handle,
    })
}
