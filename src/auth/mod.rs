//! Authentication and session core.
//!
//! This module is the identity layer of the server: it hashes credentials,
//! issues and validates signed access tokens, manages long-lived refresh
//! sessions, and revokes access at logout.
//!
//! # Module Structure
//!
//! - [`password`] - Argon2id password hashing and verification
//! - [`jwt`] - Access token signing and validation (HS256)
//! - [`service`] - Orchestration: register, login, refresh, validate, logout
//! - [`middleware`] - Axum layer and extractor for protected routes
//!
//! # Session model
//!
//! An access token is a short-lived self-contained JWT; a refresh session is
//! a long-lived server-held row behind an opaque token used solely to mint
//! new access tokens. Logout always deletes the user's refresh sessions;
//! for privileged roles (teacher, admin) it additionally denylists the
//! presented access token's `jti`, closing the replay window of a
//! still-valid token. Student tokens simply ride out their short horizon —
//! this hybrid policy keeps the denylist bounded to the small, audit-relevant
//! population where a stolen token hurts most.
//!
//! # Usage
//!
//! ```ignore
//! use academi::auth::{jwt::TokenCodec, service::AuthService};
//!
//! let codec = TokenCodec::new(config.jwt_secret, config.jwt_issuer, 900);
//! let auth = AuthService::new(db, codec, 604_800);
//! let session = auth.login(credentials).await?;
//! ```

/// Access token signing, validation, and claims.
pub mod jwt;
/// Authentication middleware and extractors for protected routes.
pub mod middleware;
/// Password hashing and verification.
pub mod password;
/// Registration, login, refresh, validation, and logout orchestration.
pub mod service;
