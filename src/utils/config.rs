use serde::Deserialize;
use std::env;

/// Immutable application configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the local database file, or a remote libsql URL.
    pub url: String,
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Access token validity in seconds.
    pub access_expiry_secs: i64,
    /// Refresh session validity in seconds.
    pub refresh_expiry_secs: i64,
}

impl Config {
    /// Loads configuration from environment variables, reading `.env` first
    /// if present.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "academi.db".to_string()),
                auth_token: env::var("DATABASE_AUTH_TOKEN").ok(),
            },
            auth: AuthConfig {
                // No default: refusing to start beats signing with a guessable key
                jwt_secret: env::var("JWT_SECRET")?,
                jwt_issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "academi-backend".to_string()),
                access_expiry_secs: env::var("JWT_ACCESS_EXPIRY")
                    .unwrap_or_else(|_| "900".to_string())
                    .parse()?,
                refresh_expiry_secs: env::var("JWT_REFRESH_EXPIRY")
                    .unwrap_or_else(|_| "604800".to_string())
                    .parse()?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.auth.jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 bytes".into());
        }
        if self.auth.access_expiry_secs <= 0 || self.auth.refresh_expiry_secs <= 0 {
            return Err("token expiries must be positive".into());
        }
        Ok(())
    }
}
