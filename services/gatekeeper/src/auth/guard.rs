//! Resolve-then-authorize route layer.
//!
//! # Purpose
//! Every protected route runs the same sequence: extract the credential,
//! resolve the session, build the target resource, ask the authorization gate,
//! and only then call the handler. This module expresses that sequence once as
//! an axum route layer parameterized per route by a [`Guard`].
//!
//! # Key invariants
//! - Missing credential: 401, the session resolver and gate are not called.
//! - Rejected session: 401, the gate is not called.
//! - Denied (or failed) policy check: 403, the handler is not called.
//! - On allow, an [`Authorized`] value is placed in request extensions for the
//!   handler to consume.
//!
//! # How to use
//! ```rust,ignore
//! let route = protect(
//!     axum::routing::post(admin_handler),
//!     &state,
//!     Guard::new("api", "write").fixed_id("admin-endpoint"),
//! );
//! ```
use crate::api::error::{ApiError, api_forbidden, api_invalid_input, api_unauthenticated};
use crate::app::AppState;
use crate::auth::principal::{Attributes, Decision, Principal, Resource, Session};
use async_trait::async_trait;
use axum::extract::{FromRequestParts, RawPathParams, Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use axum::routing::MethodRouter;
use std::sync::Arc;

/// How the resource id is derived from the request.
#[derive(Debug, Clone)]
pub enum ResourceId {
    Fixed(String),
    PathParam(&'static str),
}

/// Attributes and extra principal roles contributed by the target resource.
#[derive(Debug, Clone, Default)]
pub struct ResourceDetails {
    pub attributes: Attributes,
    pub derived_roles: Vec<String>,
}

/// Builds resource attributes for a guarded route.
#[async_trait]
pub trait AttributeLoader: Send + Sync {
    async fn load(
        &self,
        state: &AppState,
        resource_id: &str,
        principal: &Principal,
    ) -> Result<ResourceDetails, ApiError>;
}

/// Fixed attribute set, independent of caller and resource id.
#[derive(Debug, Clone, Default)]
pub struct StaticAttributes(pub Attributes);

#[async_trait]
impl AttributeLoader for StaticAttributes {
    async fn load(
        &self,
        _state: &AppState,
        _resource_id: &str,
        _principal: &Principal,
    ) -> Result<ResourceDetails, ApiError> {
        Ok(ResourceDetails {
            attributes: self.0.clone(),
            derived_roles: Vec::new(),
        })
    }
}

/// Per-route authorization requirement.
#[derive(Clone)]
pub struct Guard {
    kind: String,
    action: String,
    resource_id: ResourceId,
    loader: Arc<dyn AttributeLoader>,
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("kind", &self.kind)
            .field("action", &self.action)
            .field("resource_id", &self.resource_id)
            .finish_non_exhaustive()
    }
}

impl Guard {
    pub fn new(kind: &str, action: &str) -> Self {
        Self {
            kind: kind.to_string(),
            action: action.to_string(),
            resource_id: ResourceId::Fixed(String::new()),
            loader: Arc::new(StaticAttributes::default()),
        }
    }

    pub fn fixed_id(mut self, id: &str) -> Self {
        self.resource_id = ResourceId::Fixed(id.to_string());
        self
    }

    pub fn path_id(mut self, param: &'static str) -> Self {
        self.resource_id = ResourceId::PathParam(param);
        self
    }

    pub fn attributes(self, attributes: Attributes) -> Self {
        self.loader(StaticAttributes(attributes))
    }

    pub fn loader(mut self, loader: impl AttributeLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

/// Outcome of a successful guard pass, available to handlers via
/// `Extension<Authorized>`.
#[derive(Debug, Clone)]
pub struct Authorized {
    /// Session exactly as resolved.
    pub session: Session,
    /// Principal sent to the policy service, including resource-derived roles.
    pub principal: Principal,
    pub resource: Resource,
    pub decision: Decision,
}

/// Outcome of the session-only layer.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

#[derive(Clone)]
struct GuardContext {
    state: AppState,
    guard: Arc<Guard>,
}

/// Wrap a method router with the resolve-then-authorize layer.
pub fn protect(
    route: MethodRouter<AppState>,
    state: &AppState,
    guard: Guard,
) -> MethodRouter<AppState> {
    let context = GuardContext {
        state: state.clone(),
        guard: Arc::new(guard),
    };
    route.route_layer(from_fn_with_state(context, authorize_request))
}

/// Wrap a method router with session resolution only (no policy check).
pub fn authenticate(route: MethodRouter<AppState>, state: &AppState) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(state.clone(), authenticate_request))
}

/// Resolve the caller's session or fail with 401.
pub async fn resolve_session(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<Session, ApiError> {
    let credential = state
        .credentials
        .extract(headers)
        .ok_or_else(|| api_unauthenticated("no session token provided"))?;
    state.sessions.resolve(credential).await.map_err(|err| {
        tracing::info!(error = %err, "session rejected");
        api_unauthenticated("invalid session")
    })
}

async fn authenticate_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = resolve_session(&state, request.headers()).await?;
    request.extensions_mut().insert(Authenticated(session));
    Ok(next.run(request).await)
}

async fn authorize_request(
    State(context): State<GuardContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let GuardContext { state, guard } = context;
    let session = resolve_session(&state, request.headers()).await?;

    let (mut parts, body) = request.into_parts();
    let resource_id = match &guard.resource_id {
        ResourceId::Fixed(id) => id.clone(),
        ResourceId::PathParam(name) => {
            let params = RawPathParams::from_request_parts(&mut parts, &())
                .await
                .map_err(|_| api_invalid_input("invalid path parameters"))?;
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| api_invalid_input("missing resource id"))?
        }
    };

    let details = guard
        .loader
        .load(&state, &resource_id, &session.principal)
        .await?;
    let principal = session.principal.with_extra_roles(&details.derived_roles);
    let resource = Resource::new(&guard.kind, resource_id).with_attributes(details.attributes);

    let allowed = state.gate.authorize(&principal, &resource, &guard.action).await;
    tracing::info!(
        principal = %principal.id,
        kind = %resource.kind,
        resource = %resource.id,
        action = %guard.action,
        allowed,
        "authorization decision"
    );
    if !allowed {
        return Err(api_forbidden("insufficient permissions"));
    }

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(Authorized {
        session,
        principal,
        resource,
        decision: Decision {
            action: guard.action.clone(),
            allowed: true,
        },
    });
    Ok(next.run(request).await)
}
