use crate::types::{AppError, RefreshSession, Result, User, UserRole};
use chrono::Utc;
use libsql::{Builder, Connection, Database};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;

/// Database client backing the user directory, refresh sessions, and the
/// access-token revocation denylist.
///
/// All operations are single-row inserts, lookups, or deletes; the store's
/// own atomicity is the only synchronization relied upon.
pub struct DbClient {
    _db: Database,
    conn: Connection,
}

impl DbClient {
    /// Opens a local database file (or `:memory:`) and applies the schema.
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        Self::init(db).await
    }

    /// Connects to a remote libsql database and applies the schema.
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to database: {}", e)))?;

        Self::init(db).await
    }

    async fn init(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let client = Self { _db: db, conn };
        client.initialize_schema().await?;

        Ok(client)
    }

    fn connection(&self) -> Connection {
        self.conn.clone()
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                role TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create users table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS refresh_sessions (
                id TEXT PRIMARY KEY,
                token TEXT UNIQUE NOT NULL,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                is_revoked INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create refresh_sessions table: {}", e)))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_refresh_sessions_user_id
             ON refresh_sessions(user_id)",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to index refresh_sessions: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS token_blacklist (
                id TEXT PRIMARY KEY,
                jti TEXT UNIQUE NOT NULL,
                token TEXT NOT NULL,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create token_blacklist table: {}", e)))?;

        Ok(())
    }

    // ============= User directory =============

    pub async fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.connection();

        conn.execute(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                user.id.as_str(),
                user.email.as_str(),
                user.password_hash.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.role.as_str(),
                user.is_active as i64,
                user.created_at,
                user.updated_at,
            ),
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::Database(format!("Failed to create user: {}", e))
            }
        })?;

        Ok(())
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.connection();

        let mut rows = conn
            .query(
                "SELECT id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
                 FROM users WHERE email = ?",
                [email],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(|e| AppError::Database(e.to_string()))? {
            Some(row) => Ok(Some(Self::user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let conn = self.connection();

        let mut rows = conn
            .query(
                "SELECT id, email, password_hash, first_name, last_name, role, is_active, created_at, updated_at
                 FROM users WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query user: {}", e)))?;

        match rows.next().await.map_err(|e| AppError::Database(e.to_string()))? {
            Some(row) => Ok(Some(Self::user_from_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.connection();

        let mut rows = conn
            .query("SELECT COUNT(*) FROM users WHERE email = ?", [email])
            .await
            .map_err(|e| AppError::Database(format!("Failed to query users: {}", e)))?;

        let count: i64 = match rows.next().await.map_err(|e| AppError::Database(e.to_string()))? {
            Some(row) => row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            None => 0,
        };

        Ok(count > 0)
    }

    /// Flips a user inactive. Directory operation used by account
    /// administration; validation observes it on the next request.
    pub async fn deactivate_user(&self, id: &str) -> Result<()> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        conn.execute(
            "UPDATE users SET is_active = 0, updated_at = ? WHERE id = ?",
            (now, id),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to deactivate user: {}", e)))?;

        Ok(())
    }

    fn user_from_row(row: &libsql::Row) -> Result<User> {
        let role_str: String = row.get(5).map_err(|e| AppError::Database(e.to_string()))?;
        let is_active: i64 = row.get(6).map_err(|e| AppError::Database(e.to_string()))?;

        Ok(User {
            id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            email: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
            password_hash: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
            first_name: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
            last_name: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
            role: role_str.parse::<UserRole>()?,
            is_active: is_active != 0,
            created_at: row.get(7).map_err(|e| AppError::Database(e.to_string()))?,
            updated_at: row.get(8).map_err(|e| AppError::Database(e.to_string()))?,
        })
    }

    // ============= Refresh sessions =============

    /// Creates a refresh session with a fresh 32-byte random opaque token.
    pub async fn create_refresh_session(
        &self,
        user_id: &str,
        horizon_secs: i64,
    ) -> Result<RefreshSession> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        let mut token_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut token_bytes);

        let session = RefreshSession {
            id: Uuid::new_v4().to_string(),
            token: hex::encode(token_bytes),
            user_id: user_id.to_string(),
            expires_at: now + horizon_secs,
            is_revoked: false,
            created_at: now,
            updated_at: now,
        };

        conn.execute(
            "INSERT INTO refresh_sessions (id, token, user_id, expires_at, is_revoked, created_at, updated_at)
             VALUES (?, ?, ?, ?, 0, ?, ?)",
            (
                session.id.as_str(),
                session.token.as_str(),
                session.user_id.as_str(),
                session.expires_at,
                session.created_at,
                session.updated_at,
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create refresh session: {}", e)))?;

        Ok(session)
    }

    /// Looks up a refresh session by token value.
    ///
    /// Revoked, expired, and nonexistent sessions are all reported as
    /// `None`; the distinction is not security-sensitive here since every
    /// one of them must fail a refresh.
    pub async fn get_refresh_session(&self, token: &str) -> Result<Option<RefreshSession>> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                "SELECT id, token, user_id, expires_at, is_revoked, created_at, updated_at
                 FROM refresh_sessions
                 WHERE token = ? AND is_revoked = 0 AND expires_at > ?",
                (token, now),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query refresh session: {}", e)))?;

        match rows.next().await.map_err(|e| AppError::Database(e.to_string()))? {
            Some(row) => {
                let is_revoked: i64 = row.get(4).map_err(|e| AppError::Database(e.to_string()))?;
                Ok(Some(RefreshSession {
                    id: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
                    token: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
                    user_id: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
                    expires_at: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
                    is_revoked: is_revoked != 0,
                    created_at: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
                    updated_at: row.get(6).map_err(|e| AppError::Database(e.to_string()))?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Deletes every refresh session owned by the user. Used at logout;
    /// race-tolerant with concurrent logins.
    pub async fn delete_refresh_sessions_for_user(&self, user_id: &str) -> Result<u64> {
        let conn = self.connection();

        conn.execute("DELETE FROM refresh_sessions WHERE user_id = ?", [user_id])
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete refresh sessions: {}", e)))
    }

    /// Deletes refresh sessions past their expiry. Idempotent.
    pub async fn purge_expired_refresh_sessions(&self) -> Result<u64> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        conn.execute("DELETE FROM refresh_sessions WHERE expires_at < ?", [now])
            .await
            .map_err(|e| AppError::Database(format!("Failed to purge refresh sessions: {}", e)))
    }

    // ============= Token blacklist =============

    /// Inserts a revocation entry for an access token's `jti`.
    ///
    /// The `jti` column is unique; inserting the same identifier twice is a
    /// conflict. This should not occur in normal flow since every access
    /// token carries a freshly generated identifier.
    pub async fn add_revocation(
        &self,
        jti: &str,
        token: &str,
        user_id: &str,
        expires_at: i64,
    ) -> Result<()> {
        let conn = self.connection();
        let now = Utc::now().timestamp();
        let id = Uuid::new_v4().to_string();

        conn.execute(
            "INSERT INTO token_blacklist (id, jti, token, user_id, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            (id.as_str(), jti, token, user_id, expires_at, now),
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                AppError::Conflict("Token already revoked".to_string())
            } else {
                AppError::Database(format!("Failed to add revocation: {}", e))
            }
        })?;

        Ok(())
    }

    /// True if a non-expired revocation entry exists for the `jti`.
    pub async fn is_revoked(&self, jti: &str) -> Result<bool> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM token_blacklist WHERE jti = ? AND expires_at > ?",
                (jti, now),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query blacklist: {}", e)))?;

        let count: i64 = match rows.next().await.map_err(|e| AppError::Database(e.to_string()))? {
            Some(row) => row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            None => 0,
        };

        Ok(count > 0)
    }

    /// Deletes revocation entries past their expiry. Idempotent.
    pub async fn purge_expired_revocations(&self) -> Result<u64> {
        let conn = self.connection();
        let now = Utc::now().timestamp();

        conn.execute("DELETE FROM token_blacklist WHERE expires_at < ?", [now])
            .await
            .map_err(|e| AppError::Database(format!("Failed to purge blacklist: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_client() -> DbClient {
        DbClient::new_local(":memory:").await.expect("should open in-memory db")
    }

    fn sample_user(email: &str, role: UserRole) -> User {
        let now = Utc::now().timestamp();
        User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            first_name: "Sample".to_string(),
            last_name: "User".to_string(),
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let db = memory_client().await;
        let user = sample_user("alice@example.com", UserRole::Student);

        db.create_user(&user).await.expect("should create");

        let by_email = db
            .get_user_by_email("alice@example.com")
            .await
            .expect("should query")
            .expect("should exist");
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.role, UserRole::Student);
        assert!(by_email.is_active);

        let by_id = db.get_user_by_id(&user.id).await.expect("should query");
        assert!(by_id.is_some());

        assert!(db.email_exists("alice@example.com").await.expect("should query"));
        assert!(!db.email_exists("bob@example.com").await.expect("should query"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let db = memory_client().await;
        let first = sample_user("dup@example.com", UserRole::Student);
        let second = sample_user("dup@example.com", UserRole::Teacher);

        db.create_user(&first).await.expect("should create");
        let err = db.create_user(&second).await.expect_err("duplicate should fail");

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_refresh_session_lifecycle() {
        let db = memory_client().await;
        let user = sample_user("s@example.com", UserRole::Student);
        db.create_user(&user).await.expect("should create");

        let session = db
            .create_refresh_session(&user.id, 604800)
            .await
            .expect("should create session");

        // 32 random bytes, hex encoded
        assert_eq!(session.token.len(), 64);

        let found = db
            .get_refresh_session(&session.token)
            .await
            .expect("should query")
            .expect("should exist");
        assert_eq!(found.user_id, user.id);

        db.delete_refresh_sessions_for_user(&user.id)
            .await
            .expect("should delete");

        assert!(db
            .get_refresh_session(&session.token)
            .await
            .expect("should query")
            .is_none());
    }

    #[tokio::test]
    async fn test_expired_session_reported_as_absent() {
        let db = memory_client().await;
        let user = sample_user("e@example.com", UserRole::Student);
        db.create_user(&user).await.expect("should create");

        let session = db
            .create_refresh_session(&user.id, -10)
            .await
            .expect("should create session");

        assert!(
            db.get_refresh_session(&session.token)
                .await
                .expect("should query")
                .is_none(),
            "expired session must be indistinguishable from a missing one"
        );

        let purged = db.purge_expired_refresh_sessions().await.expect("should purge");
        assert_eq!(purged, 1);

        // Purge is idempotent
        let purged_again = db.purge_expired_refresh_sessions().await.expect("should purge");
        assert_eq!(purged_again, 0);
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() {
        let db = memory_client().await;
        let user = sample_user("multi@example.com", UserRole::Student);
        db.create_user(&user).await.expect("should create");

        let s1 = db.create_refresh_session(&user.id, 600).await.expect("should create");
        let s2 = db.create_refresh_session(&user.id, 600).await.expect("should create");

        assert_ne!(s1.token, s2.token);
        assert!(db.get_refresh_session(&s1.token).await.expect("q").is_some());
        assert!(db.get_refresh_session(&s2.token).await.expect("q").is_some());

        let deleted = db
            .delete_refresh_sessions_for_user(&user.id)
            .await
            .expect("should delete");
        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_blacklist_contains_and_purge() {
        let db = memory_client().await;
        let user = sample_user("admin@example.com", UserRole::Admin);
        db.create_user(&user).await.expect("should create");

        let now = Utc::now().timestamp();
        db.add_revocation("jti-live", "raw.token.a", &user.id, now + 900)
            .await
            .expect("should add");
        db.add_revocation("jti-dead", "raw.token.b", &user.id, now - 900)
            .await
            .expect("should add");

        assert!(db.is_revoked("jti-live").await.expect("q"));
        assert!(!db.is_revoked("jti-dead").await.expect("q"), "expired entries do not revoke");
        assert!(!db.is_revoked("jti-unknown").await.expect("q"));

        let purged = db.purge_expired_revocations().await.expect("should purge");
        assert_eq!(purged, 1);
        assert!(db.is_revoked("jti-live").await.expect("q"));
    }

    #[tokio::test]
    async fn test_duplicate_jti_is_conflict() {
        let db = memory_client().await;
        let user = sample_user("t@example.com", UserRole::Teacher);
        db.create_user(&user).await.expect("should create");

        let exp = Utc::now().timestamp() + 900;
        db.add_revocation("jti-x", "raw", &user.id, exp).await.expect("should add");
        let err = db
            .add_revocation("jti-x", "raw", &user.id, exp)
            .await
            .expect_err("duplicate jti should fail");

        assert!(matches!(err, AppError::Conflict(_)));
    }
}
