pub mod session;
pub mod todos;

use axum::Router;

use crate::domain::{auth::Authenticator, repository::TodoRepository};
use crate::http::state::AppState;

pub fn router<A, R>(state: AppState<A, R>) -> Router
where
    A: Authenticator + Clone,
    R: TodoRepository + Clone,
{
    Router::new()
        .merge(session::router(state.clone()))
        .merge(todos::router(state))
}
