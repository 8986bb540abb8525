use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::application::session::SessionError;
use crate::domain::{
    auth::{AuthError, Session},
    filter::Filter,
    repository::StoreError,
    todo::Todo,
    todo_list::Stats,
};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> { message: &'a str }

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self { Self { status, message: message.into() } }

    pub fn unauthorized() -> Self { Self::new(StatusCode::UNAUTHORIZED, "not logged in") }

    pub fn not_found() -> Self { Self::new(StatusCode::NOT_FOUND, "Not found") }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(ErrorBody { message: &self.message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::not_found(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status = match &e {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UsernameTaken(_) => StatusCode::CONFLICT,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Corrupt(_) | AuthError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Auth(e) => e.into(),
            SessionError::Fetch(e) => Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoBody {
    pub id: Option<String>,
    pub content: String,
    pub done: bool,
    pub order: i64,
}

impl From<&Todo> for TodoBody {
    fn from(t: &Todo) -> Self {
        Self { id: t.id.as_ref().map(|id| id.to_string()), content: t.content.clone(), done: t.done, order: t.order }
    }
}

#[derive(Debug, Serialize)]
pub struct ListBody {
    pub filter: Filter,
    pub items: Vec<TodoBody>,
    pub stats: Stats,
}

#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub token: String,
    pub username: String,
}

impl From<&Session> for SessionBody {
    fn from(s: &Session) -> Self { Self { token: s.token.to_string(), username: s.user.username.clone() } }
}

#[derive(Debug, Serialize)]
pub struct CountBody {
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ContentInput {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct DoneInput {
    pub done: bool,
}

#[derive(Debug, Deserialize)]
pub struct FilterInput {
    pub filter: Filter,
}
