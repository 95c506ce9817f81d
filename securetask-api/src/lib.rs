//! # SecureTask API Server Library
//!
//! Core functionality for the SecureTask API server.
//!
//! ## Modules
//!
//! - `app`: Application state, auth layer, and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Cross-cutting HTTP middleware
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
