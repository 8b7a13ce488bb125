//! # Academi Server
//!
//! Identity and session backend for the Academi learning platform:
//! credential authentication, short-lived JWT access tokens, long-lived
//! refresh sessions, and hybrid logout revocation.
//!
//! ## Overview
//!
//! The crate can be used two ways:
//!
//! 1. **As a standalone server** - Run the `academi-server` binary
//! 2. **As a library** - Mount [`api::routes::create_router`] inside your
//!    own axum application
//!
//! ## Session model
//!
//! Login issues two credentials: a self-contained HS256 JWT valid for a
//! short horizon (15 minutes by default) and an opaque refresh token backed
//! by a server-held session row valid for a long horizon (7 days). Refresh
//! mints a new access token without rotating the session. Logout deletes
//! the user's refresh sessions; for privileged roles it additionally
//! denylists the presented access token so it dies before its natural
//! expiry.
//!
//! ## Modules
//!
//! - [`auth`] - Password hashing, JWT codec, auth orchestration, middleware
//! - [`api`] - REST handlers and route wiring
//! - [`db`] - libsql client: users, refresh sessions, token blacklist
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration loading

#![warn(missing_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Authentication and session core.
pub mod auth;
/// Database client.
pub mod db;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use auth::service::AuthService;
pub use db::DbClient;
pub use types::{AppError, Result};
pub use utils::config::Config;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup
    pub config: Arc<Config>,
    /// Database client
    pub db: Arc<DbClient>,
    /// Authentication service
    pub auth_service: Arc<AuthService>,
}
