use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use crate::domain::{
    auth::{AuthError, Authenticator, Credentials, Session, SessionToken},
    todo::{User, UserId},
};

/// How long a session stays valid after it was opened.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Accounts and sessions kept next to the todos.
#[derive(Clone)]
pub struct SqliteAuthenticator {
    pool: Arc<Pool<Sqlite>>,
    ttl: Duration,
}

impl SqliteAuthenticator {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool: Arc::new(pool), ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS) }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    async fn open_session(&self, user: User) -> Result<Session, AuthError> {
        let token = SessionToken::generate();
        let created_at = Utc::now();
        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)")
            .bind(token.0.to_string())
            .bind(user.id.0.to_string())
            .bind(created_at.to_rfc3339())
            .execute(&*self.pool)
            .await?;
        Ok(Session { token, user, expires_at: created_at + self.ttl })
    }
}

/// Argon2id with a fresh random salt, encoded as a PHC string.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Backend(format!("hashing password: {e}")))
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Corrupt(format!("password hash: {e}")))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

fn validate(credentials: &Credentials) -> Result<(), AuthError> {
    if credentials.username.trim().is_empty() {
        return Err(AuthError::Validation("Username is required.".into()));
    }
    if credentials.password.is_empty() {
        return Err(AuthError::Validation("Password is required.".into()));
    }
    Ok(())
}

fn parse_user(id: &str, username: String) -> Result<User, AuthError> {
    let id = Uuid::parse_str(id).map_err(|e| AuthError::Corrupt(format!("user id {id}: {e}")))?;
    Ok(User { id: UserId(id), username })
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, AuthError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| AuthError::Corrupt(format!("timestamp {value}: {e}")))
}

#[async_trait]
impl Authenticator for SqliteAuthenticator {
    async fn init(&self) -> Result<(), AuthError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        validate(credentials)?;
        let username = credentials.username.trim();
        let taken = sqlx::query("SELECT 1 FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&*self.pool)
            .await?;
        if taken.is_some() {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        let user = User { id: UserId(Uuid::new_v4()), username: username.to_string() };
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(user.id.0.to_string())
            .bind(&user.username)
            .bind(hash_password(&credentials.password)?)
            .bind(Utc::now().to_rfc3339())
            .execute(&*self.pool)
            .await?;
        self.open_session(user).await
    }

    async fn log_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let row = sqlx::query("SELECT id, username, password_hash FROM users WHERE username = ?1")
            .bind(credentials.username.trim())
            .fetch_optional(&*self.pool)
            .await?;
        let Some(row) = row else { return Err(AuthError::InvalidCredentials) };
        let stored: String = row.try_get("password_hash")?;
        if !verify_password(&credentials.password, &stored)? {
            return Err(AuthError::InvalidCredentials);
        }
        let id: String = row.try_get("id")?;
        let user = parse_user(&id, row.try_get("username")?)?;
        self.open_session(user).await
    }

    async fn current_session(&self, token: &SessionToken) -> Result<Option<Session>, AuthError> {
        let row = sqlx::query(
            "SELECT users.id AS id, users.username AS username, sessions.created_at AS created_at FROM sessions
             JOIN users ON users.id = sessions.user_id WHERE sessions.token = ?1",
        )
        .bind(token.0.to_string())
        .fetch_optional(&*self.pool)
        .await?;
        let Some(row) = row else { return Ok(None) };
        let id: String = row.try_get("id")?;
        let user = parse_user(&id, row.try_get("username")?)?;
        let created_at: String = row.try_get("created_at")?;
        let session = Session { token: token.clone(), user, expires_at: parse_time(&created_at)? + self.ttl };
        if session.is_expired(Utc::now()) {
            tracing::info!(user = %session.user.username, "session expired");
            self.log_out(token).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn log_out(&self, token: &SessionToken) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token.0.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(())
    }
}
