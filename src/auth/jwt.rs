use crate::types::{AppError, Claims, Result, User};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

/// Signs and validates access tokens.
///
/// The signing secret and issuer are fixed at construction for the lifetime
/// of the process; there is no runtime rotation.
pub struct TokenCodec {
    secret: String,
    issuer: String,
    access_expiry_secs: i64,
}

impl TokenCodec {
    /// Creates a new codec.
    ///
    /// # Arguments
    /// * `secret` - HMAC key, at least 32 bytes (validated by config loading)
    /// * `issuer` - Value for the `iss` claim, checked on parse
    /// * `access_expiry_secs` - Access token validity in seconds
    pub fn new(secret: String, issuer: String, access_expiry_secs: i64) -> Self {
        Self {
            secret,
            issuer,
            access_expiry_secs,
        }
    }

    /// Signs an access token for the user and returns it with its expiry.
    ///
    /// Each token carries a freshly generated `jti`, which later serves as
    /// the revocation lookup key.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(self.access_expiry_secs);

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok((token, expires_at))
    }

    /// Verifies a token and returns its claims.
    ///
    /// Only HS256 is accepted, expiry is enforced with zero leeway, and the
    /// issuer must match. All failure modes collapse to a single outward
    /// "invalid token" signal; the distinct cause is logged at debug level.
    pub fn parse(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| {
            let cause = match e.kind() {
                ErrorKind::ExpiredSignature => "expired",
                ErrorKind::InvalidSignature => "signature mismatch",
                ErrorKind::InvalidAlgorithm => "wrong algorithm",
                ErrorKind::InvalidIssuer => "wrong issuer",
                _ => "malformed",
            };
            tracing::debug!(cause, "access token rejected");
            AppError::Credential("Invalid token".to_string())
        })
    }
}
