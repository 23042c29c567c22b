//! Gatekeeper HTTP API module.
//!
//! # Purpose
//! Exposes route handler modules, the shared error helpers, and the request
//! and response payload types.
pub mod account;
pub mod documents;
pub mod error;
pub mod openapi;
pub mod resources;
pub mod system;
pub mod types;
pub mod users;
