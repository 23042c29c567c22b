//! In-memory implementation of the document store.
//!
//! # Purpose
//! Implements `DocumentStore` with a `HashMap` guarded by `tokio::sync::RwLock`.
//! It exists for local development and tests and stands in for a real
//! persistence layer.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: write locks for mutations, read locks for
//!   reads.
use super::DocumentStore;
use crate::model::{Document, NewDocument, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the sample documents used by the demo flows.
    pub fn seeded() -> Self {
        let samples = [
            Document {
                id: "doc-1".to_string(),
                title: "Sample Document".to_string(),
                content: "This is a test document".to_string(),
                visibility: VISIBILITY_PUBLIC.to_string(),
                owner_id: "user123".to_string(),
                shared_with: vec!["user456".to_string()],
                created_at: None,
            },
            Document {
                id: "doc-2".to_string(),
                title: "Private Notes".to_string(),
                content: "Owner-only notes".to_string(),
                visibility: VISIBILITY_PRIVATE.to_string(),
                owner_id: "user456".to_string(),
                shared_with: Vec::new(),
                created_at: None,
            },
        ];
        let documents = samples
            .into_iter()
            .map(|doc| (doc.id.clone(), doc))
            .collect();
        Self {
            documents: Arc::new(RwLock::new(documents)),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get_document(&self, id: &str) -> Option<Document> {
        self.documents.read().await.get(id).cloned()
    }

    async fn create_document(&self, document: NewDocument) -> Document {
        let id = format!("doc_{}", uuid::Uuid::new_v4().simple());
        let created = Document {
            id: id.clone(),
            title: document.title,
            content: document.content,
            visibility: document.visibility,
            owner_id: document.owner_id,
            shared_with: Vec::new(),
            created_at: Some(Utc::now()),
        };
        self.documents.write().await.insert(id, created.clone());
        created
    }

    async fn count_documents(&self) -> usize {
        self.documents.read().await.len()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_store_has_sample_documents() {
        let store = InMemoryDocumentStore::seeded();
        let doc = store.get_document("doc-1").await.expect("doc");
        assert_eq!(doc.owner_id, "user123");
        assert_eq!(store.count_documents().await, 2);
        assert!(store.get_document("missing").await.is_none());
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let store = InMemoryDocumentStore::new();
        let created = store
            .create_document(NewDocument {
                title: "Plan".to_string(),
                content: "body".to_string(),
                visibility: VISIBILITY_PRIVATE.to_string(),
                owner_id: "user123".to_string(),
            })
            .await;
        assert!(created.id.starts_with("doc_"));
        assert!(created.created_at.is_some());
        let fetched = store.get_document(&created.id).await.expect("doc");
        assert_eq!(fetched, created);
        assert_eq!(store.backend_name(), "memory");
    }
}
