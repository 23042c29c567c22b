//! Session resolution and issuance against the external session service.
//!
//! # Purpose
//! Turns an opaque credential into a [`Session`] by asking the session
//! service to verify it, and forwards signup/signin/role-assignment/session
//! calls for the account endpoints.
//!
//! # Key invariants
//! - Every failure (non-2xx, non-`OK` status, transport error, timeout,
//!   malformed body, failed role lookup) is a rejection. Callers map it to 401.
//! - Exactly one verify call per resolution, plus one role lookup when roles
//!   are sourced from the user-role store.
//!
//! # Security considerations
//! - Credentials and passwords are never logged; only status strings are.
//! - The session service URL is never included in client-facing errors.
use crate::auth::principal::{DEFAULT_ROLE, Principal, Session};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::str::FromStr;

const STATUS_OK: &str = "OK";

/// Where principal roles come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleSource {
    /// Roles embedded in the verified session payload at creation time.
    Session,
    /// Roles fetched from the user-role store on every request.
    Store,
}

impl FromStr for RoleSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "session" | "token" => Ok(Self::Session),
            "store" => Ok(Self::Store),
            other => Err(format!("unknown role source: {other}")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("empty credential")]
    EmptyCredential,
    #[error("session service answered {0}")]
    Rejected(String),
    #[error("unexpected status: {0}")]
    Status(reqwest::StatusCode),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SessionError {
    /// Status string reported by the session service, if any.
    pub fn upstream_status(&self) -> Option<&str> {
        match self {
            Self::Rejected(status) => Some(status),
            _ => None,
        }
    }
}

/// Resolves credentials into sessions. Implementations must never panic and
/// must report every failure as `Err`.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<Session, SessionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub access_token: String,
    pub handle: String,
}

/// Account operations forwarded to the session service.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserAccount, SessionError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserAccount, SessionError>;
    /// Create a session whose payload carries `roles` and the user's email.
    async fn create_session(
        &self,
        user: &UserAccount,
        roles: &[String],
    ) -> Result<IssuedSession, SessionError>;
    async fn user_roles(&self, user_id: &str) -> Result<Vec<String>, SessionError>;
    /// Record `role` for `user_id` in the user-role store.
    async fn assign_role(&self, user_id: &str, role: &str) -> Result<(), SessionError>;
}

/// HTTP client for a SuperTokens-core style session service.
#[derive(Debug, Clone)]
pub struct SessionServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    role_source: RoleSource,
}

#[derive(Debug, Deserialize)]
struct StatusOnly {
    status: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: String,
    session: Option<VerifiedSession>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifiedSession {
    handle: Option<String>,
    user_id: String,
    #[serde(default, rename = "userDataInJWT")]
    user_data_in_jwt: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    status: String,
    user: Option<UserAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionResponse {
    status: String,
    session: Option<CreatedSession>,
    access_token: Option<AccessToken>,
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    handle: String,
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct RolesResponse {
    status: String,
    #[serde(default)]
    roles: Vec<String>,
}

impl SessionServiceClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
        role_source: RoleSource,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            role_source,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn with_api_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn post_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, SessionError> {
        let request = self.with_api_key(self.client.post(self.url(path)).json(body));
        let response = request.send().await?;
        decode(response).await
    }

    async fn put_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, SessionError> {
        let request = self.with_api_key(self.client.put(self.url(path)).json(body));
        let response = request.send().await?;
        decode(response).await
    }

    async fn verify(&self, credential: &str) -> Result<VerifiedSession, SessionError> {
        let body = json!({
            "accessToken": credential,
            "enableAntiCsrf": false,
            "doAntiCsrfCheck": false,
            "checkDatabase": false,
        });
        let response: VerifyResponse = self.post_json("/recipe/session/verify", &body).await?;
        if response.status != STATUS_OK {
            return Err(SessionError::Rejected(response.status));
        }
        let session = response
            .session
            .ok_or_else(|| SessionError::Malformed("missing session".to_string()))?;
        if session.user_id.trim().is_empty() {
            return Err(SessionError::Malformed("empty user id".to_string()));
        }
        Ok(session)
    }

    async fn account_call(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<UserAccount, SessionError> {
        let body = json!({ "email": email, "password": password });
        let response: AccountResponse = self.post_json(path, &body).await?;
        if response.status != STATUS_OK {
            return Err(SessionError::Rejected(response.status));
        }
        response
            .user
            .ok_or_else(|| SessionError::Malformed("missing user".to_string()))
    }
}

#[async_trait]
impl SessionResolver for SessionServiceClient {
    async fn resolve(&self, credential: &str) -> Result<Session, SessionError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(SessionError::EmptyCredential);
        }
        let verified = self.verify(credential).await?;
        let roles = match self.role_source {
            RoleSource::Session => roles_from_payload(&verified.user_data_in_jwt),
            RoleSource::Store => self.user_roles(&verified.user_id).await?,
        };
        Ok(session_from_verified(verified, roles))
    }
}

#[async_trait]
impl SessionIssuer for SessionServiceClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserAccount, SessionError> {
        self.account_call("/recipe/signup", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserAccount, SessionError> {
        self.account_call("/recipe/signin", email, password).await
    }

    async fn create_session(
        &self,
        user: &UserAccount,
        roles: &[String],
    ) -> Result<IssuedSession, SessionError> {
        let role = roles.first().map(String::as_str).unwrap_or(DEFAULT_ROLE);
        let body = json!({
            "userId": user.id,
            "enableAntiCsrf": false,
            "userDataInJWT": {
                "userId": user.id,
                "email": user.email,
                "role": role,
                "roles": roles,
            },
            "userDataInDatabase": {},
        });
        let response: CreateSessionResponse = self.post_json("/recipe/session", &body).await?;
        if response.status != STATUS_OK {
            return Err(SessionError::Rejected(response.status));
        }
        match (response.session, response.access_token) {
            (Some(session), Some(token)) => Ok(IssuedSession {
                access_token: token.token,
                handle: session.handle,
            }),
            _ => Err(SessionError::Malformed("missing session or token".to_string())),
        }
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<String>, SessionError> {
        let request = self.with_api_key(
            self.client
                .get(self.url("/recipe/user/roles"))
                .query(&[("userId", user_id)]),
        );
        let response: RolesResponse = decode(request.send().await?).await?;
        if response.status != STATUS_OK {
            return Err(SessionError::Rejected(response.status));
        }
        Ok(response.roles)
    }

    async fn assign_role(&self, user_id: &str, role: &str) -> Result<(), SessionError> {
        let body = json!({ "userId": user_id, "role": role });
        let response: StatusOnly = self.put_json("/recipe/user/role", &body).await?;
        if response.status != STATUS_OK {
            return Err(SessionError::Rejected(response.status));
        }
        Ok(())
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, SessionError> {
    let status = response.status();
    if !status.is_success() {
        // Some deployments answer 401 with a JSON status body.
        if status == reqwest::StatusCode::UNAUTHORIZED
            && let Ok(body) = response.json::<StatusOnly>().await
        {
            return Err(SessionError::Rejected(body.status));
        }
        return Err(SessionError::Status(status));
    }
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| SessionError::Malformed(err.to_string()))
}

fn roles_from_payload(payload: &Map<String, Value>) -> Vec<String> {
    let mut roles = BTreeSet::new();
    if let Some(Value::Array(values)) = payload.get("roles") {
        roles.extend(
            values
                .iter()
                .filter_map(Value::as_str)
                .filter(|role| !role.is_empty())
                .map(str::to_string),
        );
    }
    if let Some(role) = payload.get("role").and_then(Value::as_str)
        && !role.is_empty()
    {
        roles.insert(role.to_string());
    }
    roles.into_iter().collect()
}

/// The `role` claim is kept only while it is one of the resolved roles;
/// otherwise the first role in source order stands in for it.
fn session_from_verified(verified: VerifiedSession, roles: Vec<String>) -> Session {
    let roles = if roles.is_empty() {
        vec![DEFAULT_ROLE.to_string()]
    } else {
        roles
    };
    let role = verified
        .user_data_in_jwt
        .get("role")
        .and_then(Value::as_str)
        .filter(|claim| roles.iter().any(|role| role == claim))
        .map(str::to_string)
        .or_else(|| roles.first().cloned());
    let mut principal = Principal::new(verified.user_id, roles);
    if let Some(email) = verified.user_data_in_jwt.get("email").and_then(Value::as_str) {
        principal = principal.with_attribute("email", email);
    }
    Session {
        handle: verified.handle,
        principal,
        role,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verified(payload: Value) -> VerifiedSession {
        VerifiedSession {
            handle: Some("h-1".to_string()),
            user_id: "user123".to_string(),
            user_data_in_jwt: payload.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn payload_roles_merge_array_and_single_role() {
        let payload = json!({ "role": "admin", "roles": ["auditor", "admin", ""] });
        let roles = roles_from_payload(payload.as_object().unwrap());
        assert_eq!(roles, vec!["admin".to_string(), "auditor".to_string()]);
    }

    #[test]
    fn missing_roles_default_to_user() {
        let session = session_from_verified(verified(json!({})), Vec::new());
        assert_eq!(session.principal.id, "user123");
        assert_eq!(session.principal.primary_role(), DEFAULT_ROLE);
        assert_eq!(session.handle.as_deref(), Some("h-1"));
    }

    #[test]
    fn email_is_carried_as_attribute() {
        let session = session_from_verified(
            verified(json!({ "email": "admin@test.com", "role": "admin" })),
            vec!["admin".to_string()],
        );
        assert_eq!(session.principal.email(), Some("admin@test.com"));
        assert!(session.principal.roles.contains("admin"));
    }

    #[test]
    fn role_claim_is_kept_over_sorted_roles() {
        let payload = json!({ "role": "user", "roles": ["admin", "user"] });
        let roles = roles_from_payload(payload.as_object().unwrap());
        let session = session_from_verified(verified(payload), roles);
        assert_eq!(session.principal.primary_role(), "admin");
        assert_eq!(session.role(), "user");
    }

    #[test]
    fn stale_role_claim_gives_way_to_store_roles() {
        let session = session_from_verified(
            verified(json!({ "role": "admin" })),
            vec!["user".to_string()],
        );
        assert_eq!(session.role(), "user");
    }

    #[test]
    fn role_source_parses() {
        assert_eq!("session".parse(), Ok(RoleSource::Session));
        assert_eq!("STORE".parse(), Ok(RoleSource::Store));
        assert!("ldap".parse::<RoleSource>().is_err());
    }

    #[tokio::test]
    async fn empty_credential_is_rejected_without_network() {
        let client = SessionServiceClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1",
            None,
            RoleSource::Session,
        );
        let err = client.resolve("   ").await.err().expect("rejected");
        assert!(matches!(err, SessionError::EmptyCredential));
    }
}
