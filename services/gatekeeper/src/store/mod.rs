//! Document storage abstraction.
//!
//! # Purpose
//! Persistence is outside this service's scope; the trait is the seam where a
//! real store plugs in behind the same resource-building interface. The
//! in-memory implementation is seeded with sample records.
use crate::model::{Document, NewDocument};
use async_trait::async_trait;

pub mod memory;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_document(&self, id: &str) -> Option<Document>;
    /// Stores `document` under a freshly generated `doc_<uuid>` id.
    async fn create_document(&self, document: NewDocument) -> Document;
    async fn count_documents(&self) -> usize;
    fn backend_name(&self) -> &'static str;
}
