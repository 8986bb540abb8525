use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::{manage_todos::ManageTodos, session::AppView};
use crate::domain::{
    auth::{Authenticator, SessionToken},
    repository::TodoRepository,
};
use crate::http::types::ApiError;

/// One session's view. Requests on the same session serialize on its mutex;
/// different sessions never wait on each other.
pub type SharedView<A, R> = Arc<Mutex<AppView<A, R>>>;

pub struct SessionEntry<A: Authenticator, R: TodoRepository + Clone> {
    expires_at: DateTime<Utc>,
    view: SharedView<A, R>,
}

pub type Sessions<A, R> = HashMap<SessionToken, SessionEntry<A, R>>;

/// Shared server state: the collaborators and one authenticated view per session token.
#[derive(Clone)]
pub struct AppState<A: Authenticator + Clone, R: TodoRepository + Clone> {
    pub auth: A,
    pub repo: R,
    sessions: Arc<Mutex<Sessions<A, R>>>,
}

impl<A: Authenticator + Clone, R: TodoRepository + Clone> AppState<A, R> {
    pub fn new(auth: A, repo: R) -> Self { Self { auth, repo, sessions: Arc::new(Mutex::new(HashMap::new())) } }

    pub fn anonymous_view(&self) -> AppView<A, R> { AppView::anonymous(self.auth.clone(), self.repo.clone()) }

    /// The view behind `token`. Tokens not seen since startup are resumed from the
    /// authenticator, which re-fetches the user's todos outside the map lock.
    /// A view whose fetch failed is never cached.
    pub async fn resume(&self, token: &SessionToken) -> Result<SharedView<A, R>, ApiError> {
        if let Some(view) = self.cached(token).await {
            return Ok(view);
        }
        let mut app = self.anonymous_view();
        if !app.resume(token).await? {
            return Err(ApiError::unauthorized());
        }
        self.insert(app).await
    }

    /// Caches an authenticated view. If another request resumed the same session
    /// first, that view wins and `app` is dropped.
    pub async fn insert(&self, app: AppView<A, R>) -> Result<SharedView<A, R>, ApiError> {
        let Some((token, expires_at)) = app.session().map(|s| (s.token.clone(), s.expires_at)) else {
            return Err(ApiError::unauthorized());
        };
        let mut sessions = self.sessions.lock().await;
        let entry = sessions
            .entry(token)
            .or_insert_with(|| SessionEntry { expires_at, view: Arc::new(Mutex::new(app)) });
        Ok(entry.view.clone())
    }

    pub async fn remove(&self, token: &SessionToken) -> Option<SharedView<A, R>> {
        self.sessions.lock().await.remove(token).map(|entry| entry.view)
    }

    /// Number of cached views, expired ones included until the next lookup evicts them.
    pub async fn cached_sessions(&self) -> usize { self.sessions.lock().await.len() }

    async fn cached(&self, token: &SessionToken) -> Option<SharedView<A, R>> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.get(token).map(|entry| entry.view.clone())
    }
}

pub fn manage<A: Authenticator + Clone, R: TodoRepository + Clone>(app: &mut AppView<A, R>) -> Result<&mut ManageTodos<R>, ApiError> {
    app.manage_mut().ok_or_else(ApiError::unauthorized)
}

/// Reads `Authorization: Bearer <token>`.
pub fn bearer(headers: &HeaderMap) -> Result<SessionToken, ApiError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|v| v.parse().ok())
        .ok_or_else(ApiError::unauthorized)
}
