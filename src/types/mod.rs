//! Core types: users, roles, JWT claims, API request/response shapes,
//! and the application error taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= User Types =============

/// Role assigned to a user account.
///
/// Privileged roles (`Teacher`, `Admin`) are subject to access-token
/// revocation bookkeeping at logout; students are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
    Admin,
}

impl UserRole {
    /// Whether this role participates in the logout denylist.
    pub fn is_privileged(&self) -> bool {
        matches!(self, UserRole::Teacher | UserRole::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Teacher => "teacher",
            UserRole::Admin => "admin",
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(UserRole::Student),
            "teacher" => Ok(UserRole::Teacher),
            "admin" => Ok(UserRole::Admin),
            other => Err(AppError::Database(format!("unknown role: {}", other))),
        }
    }
}

/// A user account.
///
/// The password hash is never serialized to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============= Session Types =============

/// A persisted refresh session row.
///
/// The opaque `token` value is the only usable credential; it is handed to
/// the client at login and never rotated until expiry or logout.
#[derive(Debug, Clone)]
pub struct RefreshSession {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub expires_at: i64,
    pub is_revoked: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

// ============= Authentication Types =============

/// JWT claims carried by an access token.
///
/// The identity snapshot (email, names, role) is display-only; authorization
/// decisions always re-fetch the user by `sub`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    /// Unique token id, the revocation lookup key.
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

/// Response for login and refresh: access token, refresh token, the user,
/// and the access-token expiry instant.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub user: User,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

// ============= Error Types =============

/// Application error taxonomy.
///
/// `Credential` messages are deliberately generic per category so that
/// failures never reveal which sub-condition matched (anti-enumeration).
/// `Database` and `Internal` details are logged; clients see an opaque body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Credential(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Credential(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Database(msg) => {
                tracing::error!(detail = %msg, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(detail = %msg, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
