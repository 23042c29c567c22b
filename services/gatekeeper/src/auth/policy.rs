//! Authorization gate backed by an external policy decision service.
//!
//! # Purpose
//! Asks a Cerbos-style policy service whether a principal may perform actions
//! on a resource and reduces the answer to per-action allow/deny decisions.
//!
//! # Key invariants
//! - Fail-closed: transport errors, timeouts, non-2xx answers, malformed
//!   bodies, missing results and missing verdicts all produce deny.
//! - Only the exact value `EFFECT_ALLOW` for the exact requested action allows.
//! - Decisions are never cached; every call reaches the policy service.
//!
//! # Security considerations
//! - Failure details are logged server-side and never reach the client.
use crate::auth::principal::{Decision, Principal, Resource};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;

pub const EFFECT_ALLOW: &str = "EFFECT_ALLOW";

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid check input: {0}")]
    InvalidInput(&'static str),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("no result for resource {0}")]
    MissingResult(String),
}

#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    /// Evaluate several actions in one policy call. Returns one decision per
    /// requested action, in request order.
    async fn check(
        &self,
        principal: &Principal,
        resource: &Resource,
        actions: &[&str],
    ) -> Vec<Decision>;

    async fn authorize(&self, principal: &Principal, resource: &Resource, action: &str) -> bool {
        self.check(principal, resource, &[action])
            .await
            .iter()
            .any(|decision| decision.action == action && decision.allowed)
    }
}

#[derive(Debug, Clone)]
pub struct PolicyClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CheckResourcesResponse {
    #[serde(default)]
    results: Vec<CheckResult>,
}

#[derive(Debug, Deserialize)]
struct CheckResult {
    resource: Option<ResultResource>,
    #[serde(default)]
    actions: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ResultResource {
    id: Option<String>,
}

impl PolicyClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn try_check(
        &self,
        principal: &Principal,
        resource: &Resource,
        actions: &[&str],
    ) -> Result<Vec<Decision>, PolicyError> {
        validate_input(principal, resource, actions)?;
        let body = check_request_body(principal, resource, actions);
        let response = self
            .client
            .post(format!("{}/api/check/resources", self.base_url))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PolicyError::Status(status));
        }
        let bytes = response.bytes().await?;
        let parsed: CheckResourcesResponse =
            serde_json::from_slice(&bytes).map_err(|err| PolicyError::Malformed(err.to_string()))?;
        decisions_from_response(&parsed, &resource.id, actions)
    }
}

#[async_trait]
impl AuthorizationGate for PolicyClient {
    async fn check(
        &self,
        principal: &Principal,
        resource: &Resource,
        actions: &[&str],
    ) -> Vec<Decision> {
        match self.try_check(principal, resource, actions).await {
            Ok(decisions) => {
                for decision in &decisions {
                    tracing::debug!(
                        principal = %principal.id,
                        kind = %resource.kind,
                        resource = %resource.id,
                        action = %decision.action,
                        allowed = decision.allowed,
                        "policy decision"
                    );
                }
                decisions
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    principal = %principal.id,
                    kind = %resource.kind,
                    resource = %resource.id,
                    "policy check failed; denying"
                );
                actions.iter().map(|action| Decision::deny(action)).collect()
            }
        }
    }
}

fn validate_input(
    principal: &Principal,
    resource: &Resource,
    actions: &[&str],
) -> Result<(), PolicyError> {
    if principal.id.trim().is_empty() {
        return Err(PolicyError::InvalidInput("principal id"));
    }
    if resource.kind.trim().is_empty() {
        return Err(PolicyError::InvalidInput("resource kind"));
    }
    if actions.is_empty() || actions.iter().any(|action| action.trim().is_empty()) {
        return Err(PolicyError::InvalidInput("action"));
    }
    Ok(())
}

pub(crate) fn check_request_body(
    principal: &Principal,
    resource: &Resource,
    actions: &[&str],
) -> Value {
    json!({
        "requestId": uuid::Uuid::new_v4().to_string(),
        "principal": {
            "id": principal.id,
            "roles": principal.roles,
            "attr": principal.attributes,
        },
        "resources": [{
            "resource": {
                "kind": resource.kind,
                "id": resource.id,
                "attr": resource.attributes,
            },
            "actions": actions,
        }],
    })
}

fn result_id(result: &CheckResult) -> Option<&str> {
    result
        .resource
        .as_ref()
        .and_then(|resource| resource.id.as_deref())
}

fn decisions_from_response(
    response: &CheckResourcesResponse,
    resource_id: &str,
    actions: &[&str],
) -> Result<Vec<Decision>, PolicyError> {
    // A lone result may omit its resource id; one naming another resource
    // never answers for this one.
    let result = response
        .results
        .iter()
        .find(|result| result_id(result) == Some(resource_id))
        .or_else(|| match response.results.as_slice() {
            [only] if result_id(only).is_none() => Some(only),
            _ => None,
        })
        .ok_or_else(|| PolicyError::MissingResult(resource_id.to_string()))?;

    Ok(actions
        .iter()
        .map(|action| Decision {
            action: action.to_string(),
            allowed: result.actions.get(*action).map(String::as_str) == Some(EFFECT_ALLOW),
        })
        .collect())
}
