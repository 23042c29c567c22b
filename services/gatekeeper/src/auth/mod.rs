//! Session resolution and policy authorization.
//!
//! # Purpose
//! `session` turns credentials into principals, `policy` asks the external
//! decision service for allow/deny, and `guard` composes both into the route
//! layer every protected endpoint uses.
pub mod credential;
pub mod guard;
pub mod policy;
pub mod principal;
pub mod session;
