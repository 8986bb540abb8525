use async_trait::async_trait;
use thiserror::Error;

use super::todo::{Todo, TodoId, UserId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("todo {0} not found")]
    NotFound(TodoId),
    #[error("stored row is malformed: {0}")]
    Corrupt(String),
    #[error("store backend failed: {0}")]
    Backend(String),
}

/// Remote persistence for todos. Every statement is scoped to the todo's owner.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> Result<(), StoreError>;
    /// All todos with `owner == owner`, in any order.
    async fn fetch_all(&self, owner: &UserId) -> Result<Vec<Todo>, StoreError>;
    /// Creates the todo when it has no id yet, updates it otherwise. Returns its id.
    async fn save(&self, todo: &Todo) -> Result<TodoId, StoreError>;
    /// Deletes a saved todo. Returns whether a row was removed; unsaved todos are a no-op.
    async fn destroy(&self, todo: &Todo) -> Result<bool, StoreError>;
}
