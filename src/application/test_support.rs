use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::auth::{AuthError, Authenticator, Credentials, Session, SessionToken};
use crate::domain::repository::{StoreError, TodoRepository};
use crate::domain::todo::{Todo, TodoId, User, UserId};

#[derive(Clone, Default)]
pub struct InMemoryRepo {
    items: Arc<Mutex<HashMap<TodoId, Todo>>>,
    failing: Arc<AtomicBool>,
    failing_reads: Arc<AtomicBool>,
}

impl InMemoryRepo {
    pub fn fail_writes(&self, failing: bool) { self.failing.store(failing, Ordering::SeqCst); }

    pub fn fail_reads(&self, failing: bool) { self.failing_reads.store(failing, Ordering::SeqCst); }

    pub fn stored(&self, owner: &UserId) -> Vec<Todo> {
        let mut todos: Vec<Todo> = self.items.lock().unwrap().values().filter(|t| t.owner() == owner).cloned().collect();
        todos.sort_by_key(|t| t.order);
        todos
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl TodoRepository for InMemoryRepo {
    async fn init(&self) -> Result<(), StoreError> { Ok(()) }

    async fn fetch_all(&self, owner: &UserId) -> Result<Vec<Todo>, StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("store offline".into()));
        }
        let items = self.items.lock().unwrap();
        Ok(items
            .values()
            .filter(|t| t.owner() == owner)
            .map(|t| Todo::restore(t.id.clone().unwrap(), t.content.clone(), t.done, t.order, t.owner().clone()))
            .collect())
    }

    async fn save(&self, todo: &Todo) -> Result<TodoId, StoreError> {
        self.check()?;
        let mut items = self.items.lock().unwrap();
        let id = match &todo.id {
            Some(id) if !items.contains_key(id) => return Err(StoreError::NotFound(id.clone())),
            Some(id) => id.clone(),
            None => TodoId(Uuid::new_v4()),
        };
        let mut stored = todo.clone();
        stored.id = Some(id.clone());
        items.insert(id.clone(), stored);
        Ok(id)
    }

    async fn destroy(&self, todo: &Todo) -> Result<bool, StoreError> {
        self.check()?;
        let Some(id) = &todo.id else { return Ok(false) };
        Ok(self.items.lock().unwrap().remove(id).is_some())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryAuth {
    users: Arc<Mutex<HashMap<String, (String, User)>>>,
    sessions: Arc<Mutex<HashMap<SessionToken, Session>>>,
}

#[async_trait]
impl Authenticator for InMemoryAuth {
    async fn init(&self) -> Result<(), AuthError> { Ok(()) }

    async fn sign_up(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        if credentials.username.is_empty() {
            return Err(AuthError::Validation("Username is required.".into()));
        }
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&credentials.username) {
            return Err(AuthError::UsernameTaken(credentials.username.clone()));
        }
        let user = User { id: UserId(Uuid::new_v4()), username: credentials.username.clone() };
        users.insert(credentials.username.clone(), (credentials.password.clone(), user.clone()));
        drop(users);
        Ok(self.open(user))
    }

    async fn log_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let user = match self.users.lock().unwrap().get(&credentials.username) {
            Some((password, user)) if *password == credentials.password => user.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        Ok(self.open(user))
    }

    async fn current_session(&self, token: &SessionToken) -> Result<Option<Session>, AuthError> {
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }

    async fn log_out(&self, token: &SessionToken) -> Result<(), AuthError> {
        self.sessions.lock().unwrap().remove(token);
        Ok(())
    }
}

impl InMemoryAuth {
    pub fn live_sessions(&self) -> usize { self.sessions.lock().unwrap().len() }

    fn open(&self, user: User) -> Session {
        let session = Session { token: SessionToken::generate(), user, expires_at: Utc::now() + Duration::days(1) };
        self.sessions.lock().unwrap().insert(session.token.clone(), session.clone());
        session
    }
}
