use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content given to a todo created without any text.
pub const PLACEHOLDER_CONTENT: &str = "empty todo...";

/// Identifier assigned by the store on first save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TodoId(pub Uuid);

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Client-local identity of a todo, stable for the lifetime of the in-memory item.
/// Never persisted; a re-fetch hands out fresh ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClientId(Uuid);

impl Default for ClientId {
    fn default() -> Self { Self(Uuid::new_v4()) }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// A single user-owned list item.
///
/// `owner` is fixed at construction; `cid` identifies the item locally whether or
/// not it has been saved yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: Option<TodoId>,
    #[serde(skip)]
    cid: ClientId,
    pub content: String,
    pub done: bool,
    pub order: i64,
    owner: UserId,
}

impl Todo {
    /// Builds a provisional (unsaved) todo. Empty content becomes [`PLACEHOLDER_CONTENT`].
    pub fn new(content: impl Into<String>, order: i64, owner: UserId) -> Self {
        let content = content.into();
        let content = if content.is_empty() { PLACEHOLDER_CONTENT.to_string() } else { content };
        Self { id: None, cid: ClientId::default(), content, done: false, order, owner }
    }

    /// Rebuilds a todo read back from the store, exactly as persisted.
    pub fn restore(id: TodoId, content: String, done: bool, order: i64, owner: UserId) -> Self {
        Self { id: Some(id), cid: ClientId::default(), content, done, order, owner }
    }

    pub fn cid(&self) -> ClientId { self.cid }

    pub fn owner(&self) -> &UserId { &self.owner }

    pub fn toggle_done(&mut self) { self.done = !self.done; }

    pub fn edit_content(&mut self, content: impl Into<String>) { self.content = content.into(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId { UserId(Uuid::new_v4()) }

    #[test]
    fn empty_content_gets_placeholder() {
        let todo = Todo::new("", 1, owner());
        assert_eq!(todo.content, PLACEHOLDER_CONTENT);
        assert!(!todo.done);
        assert!(todo.id.is_none());
    }

    #[test]
    fn given_content_is_kept() {
        let todo = Todo::new("Buy milk", 1, owner());
        assert_eq!(todo.content, "Buy milk");
    }

    #[test]
    fn later_empty_edit_sticks() {
        let mut todo = Todo::new("Buy milk", 1, owner());
        todo.edit_content("");
        assert_eq!(todo.content, "");
    }

    #[test]
    fn restored_empty_content_is_not_substituted() {
        let todo = Todo::restore(TodoId(Uuid::new_v4()), String::new(), true, 3, owner());
        assert_eq!(todo.content, "");
        assert!(todo.done);
    }

    #[test]
    fn toggle_flips_done() {
        let mut todo = Todo::new("x", 1, owner());
        todo.toggle_done();
        assert!(todo.done);
        todo.toggle_done();
        assert!(!todo.done);
    }
}
