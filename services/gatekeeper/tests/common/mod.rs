#![allow(dead_code)]

use async_trait::async_trait;
use gatekeeper::app::AppState;
use gatekeeper::auth::credential::CredentialPolicy;
use gatekeeper::auth::policy::AuthorizationGate;
use gatekeeper::auth::principal::{Decision, Principal, Resource, Session};
use gatekeeper::auth::session::{
    IssuedSession, SessionError, SessionIssuer, SessionResolver, UserAccount,
};
use gatekeeper::store::memory::InMemoryDocumentStore;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn spawn_server(app: axum::Router) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    let server = axum::serve(listener, app.into_make_service());
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });
    (addr, handle)
}

/// Address that refuses connections: bound once, then released.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    listener.local_addr().expect("addr")
}

pub fn session(id: &str, roles: &[&str], email: Option<&str>) -> Session {
    let mut principal = Principal::new(id, roles.iter().map(|role| role.to_string()));
    if let Some(email) = email {
        principal = principal.with_attribute("email", email);
    }
    Session {
        handle: Some(format!("handle-{id}")),
        principal,
        role: roles.first().map(|role| role.to_string()),
    }
}

/// In-process session service: fixed tokens plus a tiny account registry.
#[derive(Default)]
pub struct StubSessions {
    tokens: Mutex<HashMap<String, Session>>,
    accounts: Mutex<HashMap<String, (String, UserAccount)>>,
    roles: Mutex<HashMap<String, Vec<String>>>,
    pub resolve_calls: AtomicUsize,
    pub created: Mutex<Vec<(String, Vec<String>)>>,
    pub refuse_role_assignment: AtomicBool,
}

impl StubSessions {
    /// `tok-admin` (user123, admin), `tok-user` (user456, user) and
    /// `tok-owner` (user123, user).
    pub fn standard() -> Self {
        let stub = Self::default();
        stub.insert_token(
            "tok-admin",
            session("user123", &["admin"], Some("admin@test.com")),
        );
        stub.insert_token("tok-user", session("user456", &["user"], Some("user@test.com")));
        stub.insert_token("tok-owner", session("user123", &["user"], None));
        stub
    }

    pub fn insert_token(&self, token: &str, session: Session) {
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), session);
    }

    pub fn insert_account(&self, email: &str, password: &str, id: &str, roles: &[&str]) {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            (
                password.to_string(),
                UserAccount {
                    id: id.to_string(),
                    email: email.to_string(),
                },
            ),
        );
        self.roles.lock().unwrap().insert(
            id.to_string(),
            roles.iter().map(|role| role.to_string()).collect(),
        );
    }

    pub fn resolve_count(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionResolver for StubSessions {
    async fn resolve(&self, credential: &str) -> Result<Session, SessionError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .lock()
            .unwrap()
            .get(credential)
            .cloned()
            .ok_or_else(|| SessionError::Rejected("UNAUTHORISED".to_string()))
    }
}

#[async_trait]
impl SessionIssuer for StubSessions {
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserAccount, SessionError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(SessionError::Rejected(
                "EMAIL_ALREADY_EXISTS_ERROR".to_string(),
            ));
        }
        let user = UserAccount {
            id: format!("user-{}", accounts.len() + 1),
            email: email.to_string(),
        };
        accounts.insert(email.to_string(), (password.to_string(), user.clone()));
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserAccount, SessionError> {
        match self.accounts.lock().unwrap().get(email) {
            Some((stored, user)) if stored == password => Ok(user.clone()),
            _ => Err(SessionError::Rejected(
                "WRONG_CREDENTIALS_ERROR".to_string(),
            )),
        }
    }

    async fn create_session(
        &self,
        user: &UserAccount,
        roles: &[String],
    ) -> Result<IssuedSession, SessionError> {
        self.created
            .lock()
            .unwrap()
            .push((user.id.clone(), roles.to_vec()));
        let token = format!("tok-{}", user.id);
        let principal = Principal::new(user.id.clone(), roles.iter().cloned())
            .with_attribute("email", user.email.clone());
        self.insert_token(
            &token,
            Session {
                handle: Some(format!("handle-{}", user.id)),
                principal,
                role: roles.first().cloned(),
            },
        );
        Ok(IssuedSession {
            access_token: token,
            handle: format!("handle-{}", user.id),
        })
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<String>, SessionError> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn assign_role(&self, user_id: &str, role: &str) -> Result<(), SessionError> {
        if self.refuse_role_assignment.load(Ordering::SeqCst) {
            return Err(SessionError::Rejected("UNKNOWN_ROLE_ERROR".to_string()));
        }
        let mut roles = self.roles.lock().unwrap();
        let assigned = roles.entry(user_id.to_string()).or_default();
        if !assigned.iter().any(|existing| existing == role) {
            assigned.push(role.to_string());
        }
        Ok(())
    }
}

type Rule = dyn Fn(&Principal, &Resource, &str) -> bool + Send + Sync;

/// Policy stub driven by a closure; records every evaluated request.
pub struct StubGate {
    rule: Box<Rule>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(Principal, Resource, String)>>,
}

impl StubGate {
    pub fn new(rule: impl Fn(&Principal, &Resource, &str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            rule: Box::new(rule),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn deny_all() -> Self {
        Self::new(|_, _, _| false)
    }

    /// Rules shaped like the demo policies:
    /// - `api`: read for user/admin, write for admin only
    /// - `user`: admins or self
    /// - `document`: create for user/admin, read for admin, owner, or public docs
    pub fn demo() -> Self {
        Self::new(|principal, resource, action| {
            let has = |role: &str| principal.roles.contains(role);
            match (resource.kind.as_str(), action) {
                ("api", "read") => has("user") || has("admin"),
                ("api", "write") => has("admin"),
                ("user", "read") => has("admin") || principal.id == resource.id,
                ("document", "create") => has("user") || has("admin"),
                ("document", "read") => {
                    has("admin")
                        || has("owner")
                        || resource.attributes.get("visibility").and_then(|v| v.as_str())
                            == Some("public")
                }
                _ => false,
            }
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_seen(&self) -> Option<(Principal, Resource, String)> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AuthorizationGate for StubGate {
    async fn check(
        &self,
        principal: &Principal,
        resource: &Resource,
        actions: &[&str],
    ) -> Vec<Decision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        actions
            .iter()
            .map(|action| {
                self.seen.lock().unwrap().push((
                    principal.clone(),
                    resource.clone(),
                    action.to_string(),
                ));
                Decision {
                    action: action.to_string(),
                    allowed: (self.rule)(principal, resource, action),
                }
            })
            .collect()
    }
}

pub struct Harness {
    pub sessions: Arc<StubSessions>,
    pub gate: Arc<StubGate>,
    pub documents: Arc<InMemoryDocumentStore>,
    pub state: AppState,
}

impl Harness {
    pub fn new(sessions: StubSessions, gate: StubGate) -> Self {
        Self::with_credentials(sessions, gate, CredentialPolicy::default())
    }

    pub fn with_credentials(
        sessions: StubSessions,
        gate: StubGate,
        credentials: CredentialPolicy,
    ) -> Self {
        let sessions = Arc::new(sessions);
        let gate = Arc::new(gate);
        let documents = Arc::new(InMemoryDocumentStore::seeded());
        let state = AppState {
            sessions: sessions.clone(),
            issuer: sessions.clone(),
            gate: gate.clone(),
            documents: documents.clone(),
            credentials,
            cors_origins: Vec::new().into(),
        };
        Self {
            sessions,
            gate,
            documents,
            state,
        }
    }

    pub fn app(&self) -> axum::routing::RouterIntoService<axum::body::Body, ()> {
        gatekeeper::app::build_router(self.state.clone()).into_service()
    }
}
