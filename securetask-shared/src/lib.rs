//! # SecureTask Shared Library
//!
//! Shared types and data-access logic used by the SecureTask API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, tasks, audit log)
//! - `auth`: Password hashing and JWT tokens
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the SecureTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
