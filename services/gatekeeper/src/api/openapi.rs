//! OpenAPI schema aggregation for the gatekeeper API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for docs
//! and client generation.
use crate::api::{
    account, documents, resources, system,
    types::{
        AccessResponse, CredentialsRequest, DocumentAuthorization, DocumentCreateRequest,
        DocumentCreatedResponse, DocumentResponse, ErrorResponse, HealthStatus, LoginResponse,
        LoginSession, SessionInfo, SessionUser, SignupRequest, SignupResponse, SignupUser,
        UserAuthorization, UserResponse,
    },
    users,
};
use crate::model::{Document, UserProfile};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "gatekeeper",
        version = "v1",
        description = "Session-resolving, policy-gated example API"
    ),
    paths(
        system::health,
        account::login,
        account::signup_with_role,
        account::session_info,
        resources::protected,
        resources::admin,
        users::get_user,
        documents::create_document,
        documents::get_document
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        CredentialsRequest,
        SignupRequest,
        SessionUser,
        LoginSession,
        LoginResponse,
        SignupUser,
        SignupResponse,
        SessionInfo,
        AccessResponse,
        UserAuthorization,
        UserResponse,
        UserProfile,
        Document,
        DocumentCreateRequest,
        DocumentCreatedResponse,
        DocumentAuthorization,
        DocumentResponse
    )),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "account", description = "Login, signup and session introspection"),
        (name = "resources", description = "Fixed policy-guarded API resources"),
        (name = "users", description = "Policy-guarded user lookup"),
        (name = "documents", description = "Policy-guarded documents")
    )
)]
pub struct ApiDoc;
