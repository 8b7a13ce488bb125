use crate::auth::jwt::TokenCodec;
use crate::auth::password::PasswordHasher;
use crate::db::DbClient;
use crate::types::{
    AppError, Claims, LoginRequest, LoginResponse, RefreshTokenRequest, RegisterRequest, Result,
    User, UserRole,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Orchestrates registration, login, token refresh, logout, and token
/// validation.
///
/// Composes the password hasher, the token codec, and the database-backed
/// user directory, refresh-session store, and revocation store. All
/// operations are safe to run concurrently; the only per-identity races
/// (login vs logout) are tolerated by contract, see [`Self::logout`].
pub struct AuthService {
    db: Arc<DbClient>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    refresh_expiry_secs: i64,
}

impl AuthService {
    pub fn new(db: Arc<DbClient>, codec: TokenCodec, refresh_expiry_secs: i64) -> Self {
        Self {
            db,
            hasher: PasswordHasher::new(),
            codec,
            refresh_expiry_secs,
        }
    }

    /// Registers a new user with the default `student` role.
    ///
    /// Fails with a conflict if the email is already taken (case-sensitive
    /// exact match). The returned user's hash field is populated internally
    /// but never serialized to clients.
    pub async fn register(&self, req: RegisterRequest) -> Result<User> {
        if self.db.email_exists(&req.email).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = self.hasher.hash(&req.password)?;
        let now = Utc::now().timestamp();

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: req.email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            role: UserRole::Student,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.create_user(&user).await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Authenticates credentials and opens a session.
    ///
    /// Unknown email, inactive account, and wrong password all fail with the
    /// identical "Invalid credentials" signal so the response never reveals
    /// whether an email exists. On success returns an access token, a fresh
    /// refresh session token, and the access expiry.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        let user = self
            .db
            .get_user_by_email(&req.email)
            .await?
            .ok_or_else(|| AppError::Credential("Invalid credentials".to_string()))?;

        if !user.is_active {
            return Err(AppError::Credential("Invalid credentials".to_string()));
        }

        if !self.hasher.verify(&req.password, &user.password_hash)? {
            return Err(AppError::Credential("Invalid credentials".to_string()));
        }

        let (token, expires_at) = self.codec.issue(&user)?;
        let session = self
            .db
            .create_refresh_session(&user.id, self.refresh_expiry_secs)
            .await?;

        tracing::info!(user_id = %user.id, "login");
        Ok(LoginResponse {
            token,
            refresh_token: session.token,
            user,
            expires_at,
        })
    }

    /// Mints a new access token from a refresh session.
    ///
    /// The refresh token itself is returned unchanged; sessions are not
    /// rotated on use. The owning account is re-checked so a deactivated
    /// user cannot keep minting access tokens.
    pub async fn refresh(&self, req: RefreshTokenRequest) -> Result<LoginResponse> {
        let session = self
            .db
            .get_refresh_session(&req.refresh_token)
            .await?
            .ok_or_else(|| {
                AppError::Credential("Invalid or expired refresh token".to_string())
            })?;

        let user = self
            .db
            .get_user_by_id(&session.user_id)
            .await?
            .ok_or_else(|| {
                AppError::Credential("Invalid or expired refresh token".to_string())
            })?;

        if !user.is_active {
            return Err(AppError::Credential("Account is disabled".to_string()));
        }

        let (token, expires_at) = self.codec.issue(&user)?;

        Ok(LoginResponse {
            token,
            refresh_token: session.token,
            user,
            expires_at,
        })
    }

    /// Validates an access token and returns the current user.
    ///
    /// The user is re-fetched from the directory on every call; the claims
    /// snapshot is never trusted for authorization, so deactivation takes
    /// effect within one request. For privileged roles the blacklist is
    /// additionally consulted on the token's `jti`.
    pub async fn validate(&self, token: &str) -> Result<(User, Claims)> {
        let claims = self.codec.parse(token)?;

        let user = self
            .db
            .get_user_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AppError::Credential("Invalid token".to_string()))?;

        if !user.is_active {
            return Err(AppError::Credential("Account is disabled".to_string()));
        }

        if user.role.is_privileged() && self.db.is_revoked(&claims.jti).await? {
            return Err(AppError::Credential("Token has been revoked".to_string()));
        }

        Ok((user, claims))
    }

    /// Terminates the user's sessions.
    ///
    /// Deleting the refresh sessions alone fully ends continuation for
    /// student accounts: no new access token can be minted and the current
    /// one lapses within its short horizon. Only privileged roles get a
    /// blacklist entry for the presented token, closing the replay window
    /// of a still-valid access token. An unparsable token at logout is not
    /// an error; the session deletion already satisfies the contract.
    pub async fn logout(&self, token: &str, user_id: &str, role: UserRole) -> Result<()> {
        self.db.delete_refresh_sessions_for_user(user_id).await?;

        if role.is_privileged() {
            if let Ok(claims) = self.codec.parse(token) {
                self.db
                    .add_revocation(&claims.jti, token, user_id, claims.exp)
                    .await?;
            }
        }

        tracing::info!(user_id = %user_id, role = role.as_str(), "logout");
        Ok(())
    }
}
