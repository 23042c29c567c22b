//! HTTP API request/response types.
//!
//! # Purpose
//! Defines shared payload shapes for the REST API and OpenAPI schema
//! generation. Field names follow the camelCase JSON the browser clients use.
use crate::model::{Document, UserProfile};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
}

/// Caller identity as echoed back by account and resource routes.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub session_token: String,
    pub handle: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct LoginResponse {
    pub success: bool,
    pub session: LoginSession,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SignupUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SignupResponse {
    pub message: String,
    pub user: SignupUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: String,
    pub role: String,
    pub roles: Vec<String>,
    pub session_handle: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AccessResponse {
    pub success: bool,
    pub message: String,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserAuthorization {
    pub allowed: bool,
    pub current_user_id: String,
    pub requested_user_id: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserResponse {
    pub message: String,
    pub user: UserProfile,
    pub authorization: UserAuthorization,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
pub struct DocumentCreateRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub visibility: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DocumentCreatedResponse {
    pub message: String,
    pub document: Document,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DocumentAuthorization {
    pub allowed: bool,
    pub action: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DocumentResponse {
    pub message: String,
    pub document: Document,
    pub authorization: DocumentAuthorization,
}
