//! Document endpoints guarded by `document/*` policies.
//!
//! # Purpose
//! Creation is guarded by `document/new/create`. Reads are guarded by
//! `document/<id>/read` with the stored document's fields as resource
//! attributes and an `owner` or `viewer` role derived from ownership.
//!
//! # Key invariants
//! - A denied create never reaches the store.
//! - An unknown document id is authorized against empty attributes and only
//!   then reported as 404, so existence does not leak to denied callers.
use crate::api::error::{ApiError, api_invalid_input, api_not_found};
use crate::api::types::{
    DocumentAuthorization, DocumentCreateRequest, DocumentCreatedResponse, DocumentResponse,
};
use crate::app::AppState;
use crate::auth::guard::{AttributeLoader, Authorized, ResourceDetails};
use crate::auth::principal::Principal;
use crate::model::{NewDocument, VISIBILITY_PRIVATE};
use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{Extension, Json};

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_VIEWER: &str = "viewer";

/// Loads stored document fields as policy attributes for the read guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentAttributes;

#[async_trait]
impl AttributeLoader for DocumentAttributes {
    async fn load(
        &self,
        state: &AppState,
        resource_id: &str,
        principal: &Principal,
    ) -> Result<ResourceDetails, ApiError> {
        let Some(document) = state.documents.get_document(resource_id).await else {
            return Ok(ResourceDetails::default());
        };
        let derived = if document.is_owned_by(&principal.id) {
            ROLE_OWNER
        } else {
            ROLE_VIEWER
        };
        Ok(ResourceDetails {
            attributes: document.policy_attributes(),
            derived_roles: vec![derived.to_string()],
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/documents",
    tag = "documents",
    request_body = DocumentCreateRequest,
    responses(
        (status = 200, description = "Document created", body = DocumentCreatedResponse),
        (status = 400, description = "Missing title or malformed body", body = crate::api::types::ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Policy denied create", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn create_document(
    State(state): State<AppState>,
    Extension(authorized): Extension<Authorized>,
    payload: Result<Json<DocumentCreateRequest>, JsonRejection>,
) -> Result<Json<DocumentCreatedResponse>, ApiError> {
    let Json(request) = payload.map_err(|_| api_invalid_input("invalid JSON body"))?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err(api_invalid_input("title is required"));
    }
    let visibility = request
        .visibility
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(VISIBILITY_PRIVATE)
        .to_string();

    let document = state
        .documents
        .create_document(NewDocument {
            title: title.to_string(),
            content: request.content,
            visibility,
            owner_id: authorized.session.principal.id.clone(),
        })
        .await;
    tracing::info!(
        document_id = %document.id,
        owner = %document.owner_id,
        backend = state.documents.backend_name(),
        "document created"
    );

    Ok(Json(DocumentCreatedResponse {
        message: "Document created".to_string(),
        document,
    }))
}

#[utoipa::path(
    get,
    path = "/api/documents/{doc_id}",
    tag = "documents",
    params(
        ("doc_id" = String, Path, description = "Document identifier")
    ),
    responses(
        (status = 200, description = "Document", body = DocumentResponse),
        (status = 401, description = "Missing or invalid session", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Policy denied read", body = crate::api::types::ErrorResponse),
        (status = 404, description = "Document not found", body = crate::api::types::ErrorResponse)
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
    Extension(authorized): Extension<Authorized>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let document = state
        .documents
        .get_document(&doc_id)
        .await
        .ok_or_else(|| api_not_found("document not found"))?;

    Ok(Json(DocumentResponse {
        message: "Access granted".to_string(),
        document,
        authorization: DocumentAuthorization {
            allowed: authorized.decision.allowed,
            action: authorized.decision.action,
            role: authorized.session.role().to_string(),
        },
    }))
}
