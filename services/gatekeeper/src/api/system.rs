//! Service health endpoint.
use crate::api::types::HealthStatus;
use axum::Json;
use chrono::{SecondsFormat, Utc};

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service health", body = HealthStatus))
)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
