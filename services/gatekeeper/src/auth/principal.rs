//! Principal, resource, and decision models.
//!
//! # Purpose
//! Defines the identity and target shapes that flow from the session resolver
//! into the authorization gate. All values are built per request and never
//! persisted by this service.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Free-form attribute bag forwarded to the policy service.
pub type Attributes = Map<String, Value>;

/// Role assigned when a session carries no role information.
pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub roles: BTreeSet<String>,
    pub attributes: Attributes,
}

impl Principal {
    pub fn new(id: impl Into<String>, roles: impl IntoIterator<Item = String>) -> Self {
        Self {
            id: id.into(),
            roles: roles.into_iter().collect(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Returns a copy carrying additional roles derived from the target resource.
    pub fn with_extra_roles(&self, extra: &[String]) -> Self {
        let mut principal = self.clone();
        principal.roles.extend(extra.iter().cloned());
        principal
    }

    pub fn email(&self) -> Option<&str> {
        self.attributes.get("email").and_then(Value::as_str)
    }

    /// First role in sorted order; used when a single role must be reported.
    pub fn primary_role(&self) -> &str {
        self.roles
            .iter()
            .next()
            .map(String::as_str)
            .unwrap_or(DEFAULT_ROLE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: String,
    pub id: String,
    pub attributes: Attributes,
}

impl Resource {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            attributes: Attributes::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Allow/deny verdict for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: String,
    pub allowed: bool,
}

impl Decision {
    pub fn deny(action: &str) -> Self {
        Self {
            action: action.to_string(),
            allowed: false,
        }
    }
}

/// A validated session: the opaque handle plus the principal it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub handle: Option<String>,
    pub principal: Principal,
    /// The single `role` claim the session was issued with, if any.
    pub role: Option<String>,
}

impl Session {
    /// Role reported back to clients: the session's own claim, else the
    /// principal's primary role.
    pub fn role(&self) -> &str {
        self.role
            .as_deref()
            .filter(|role| !role.is_empty())
            .unwrap_or_else(|| self.principal.primary_role())
    }
}
