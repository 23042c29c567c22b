//! Gatekeeper service library crate.
//!
//! # Purpose
//! Exposes the HTTP API surface, session and policy clients, configuration,
//! and the document store for use by the binary and tests.
//!
//! # Notes
//! Module boundaries mirror the request pipeline: credential, session, policy,
//! guard, handler.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod model;
pub mod observability;
pub mod store;
