//! Data model module.
//!
//! # Purpose
//! Re-exports the document and user records used by the API and store layers.
mod document;
mod user;

pub use document::{Document, NewDocument, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC};
pub use user::UserProfile;
