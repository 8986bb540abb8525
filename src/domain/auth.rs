use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::todo::User;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionToken(pub Uuid);

impl SessionToken {
    pub fn generate() -> Self { Self(Uuid::new_v4()) }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl std::str::FromStr for SessionToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s.trim()).map(Self) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self { username: username.into(), password: password.into() }
    }
}

/// An authenticated session. It stops being valid at `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("Username {0} is already taken.")]
    UsernameTaken(String),
    #[error("{0}")]
    Validation(String),
    #[error("stored account is malformed: {0}")]
    Corrupt(String),
    #[error("authentication backend failed: {0}")]
    Backend(String),
}

/// Account and session service.
#[async_trait]
pub trait Authenticator: Send + Sync + 'static {
    async fn init(&self) -> Result<(), AuthError>;
    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError>;
    async fn log_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;
    /// The session behind a token, carrying the current user. `None` once it was ended or expired.
    async fn current_session(&self, token: &SessionToken) -> Result<Option<Session>, AuthError>;
    async fn log_out(&self, token: &SessionToken) -> Result<(), AuthError>;
}
