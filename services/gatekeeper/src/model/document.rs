//! Document records guarded by the document routes.
//!
//! # Purpose
//! Defines the stored document shape and the conversion into policy
//! attributes.
use crate::auth::principal::Attributes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const VISIBILITY_PRIVATE: &str = "private";
pub const VISIBILITY_PUBLIC: &str = "public";

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub visibility: String,
    pub owner_id: String,
    #[serde(default)]
    pub shared_with: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Document {
    pub fn is_owned_by(&self, principal_id: &str) -> bool {
        self.owner_id == principal_id
    }

    /// Policy attributes: every field of the document except its content.
    pub fn policy_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("title".to_string(), self.title.clone().into());
        attributes.insert("visibility".to_string(), self.visibility.clone().into());
        attributes.insert("ownerId".to_string(), self.owner_id.clone().into());
        attributes.insert("sharedWith".to_string(), self.shared_with.clone().into());
        attributes
    }
}

/// Fields supplied by the caller when creating a document.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub visibility: String,
    pub owner_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_attributes_exclude_content() {
        let doc = Document {
            id: "doc-1".to_string(),
            title: "Sample Document".to_string(),
            content: "secret body".to_string(),
            visibility: VISIBILITY_PUBLIC.to_string(),
            owner_id: "user123".to_string(),
            shared_with: vec!["user456".to_string()],
            created_at: None,
        };
        let attrs = doc.policy_attributes();
        assert_eq!(attrs["ownerId"], "user123");
        assert_eq!(attrs["sharedWith"], serde_json::json!(["user456"]));
        assert!(!attrs.contains_key("content"));
        assert!(doc.is_owned_by("user123"));
        assert!(!doc.is_owned_by("user456"));
    }
}
