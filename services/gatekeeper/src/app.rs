//! Gatekeeper HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, attaches the session and authorization layers to
//! each route, and defines the shared application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth::credential::CredentialPolicy;
use crate::auth::guard::{Guard, authenticate, protect};
use crate::auth::policy::AuthorizationGate;
use crate::auth::principal::Attributes;
use crate::auth::session::{SessionIssuer, SessionResolver};
use crate::observability;
use crate::store::DocumentStore;
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{get, post};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionResolver>,
    pub issuer: Arc<dyn SessionIssuer>,
    pub gate: Arc<dyn AuthorizationGate>,
    pub documents: Arc<dyn DocumentStore>,
    pub credentials: CredentialPolicy,
    /// Browser origins allowed to call with credentials; empty mirrors any origin.
    pub cors_origins: Arc<[String]>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| observability::http_request_span(request));

    Router::new()
        .route("/health", get(api::system::health))
        .route("/api/login", post(api::account::login))
        .route("/auth/signup-with-role", post(api::account::signup_with_role))
        .route(
            "/api/session-info",
            authenticate(get(api::account::session_info), &state),
        )
        .route(
            "/api/protected",
            protect(
                get(api::resources::protected),
                &state,
                Guard::new("api", "read")
                    .fixed_id("protected-endpoint")
                    .attributes(attributes(json!({ "sensitive": true }))),
            ),
        )
        .route(
            "/api/admin",
            protect(
                post(api::resources::admin),
                &state,
                Guard::new("api", "write")
                    .fixed_id("admin-endpoint")
                    .attributes(attributes(json!({ "adminOnly": true }))),
            ),
        )
        .route(
            "/api/users/:user_id",
            protect(
                get(api::users::get_user),
                &state,
                Guard::new("user", "read").path_id("user_id"),
            ),
        )
        .route(
            "/api/documents",
            protect(
                post(api::documents::create_document),
                &state,
                Guard::new("document", "create").fixed_id("new"),
            ),
        )
        .route(
            "/api/documents/:doc_id",
            protect(
                get(api::documents::get_document),
                &state,
                Guard::new("document", "read")
                    .path_id("doc_id")
                    .loader(api::documents::DocumentAttributes),
            ),
        )
        .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&state.cors_origins))
        .layer(trace_layer)
        .with_state(state)
}

/// Credentialed CORS: the allowed origin is echoed back, never `*`.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|_| tracing::warn!(origin = %origin, "ignoring invalid CORS origin"))
                .ok()
        }))
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("rid"),
            HeaderName::from_static("fdi-version"),
            HeaderName::from_static("anti-csrf"),
            HeaderName::from_static("st-auth-mode"),
        ])
}

fn attributes(value: serde_json::Value) -> Attributes {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Attributes::new(),
    }
}
