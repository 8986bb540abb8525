use serde::Serialize;

use super::todo::{ClientId, Todo, TodoId};

/// Summary counts shown under the list.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub done: usize,
    pub remaining: usize,
    /// State of the "mark all" control: checked when nothing remains.
    pub all_done: bool,
}

/// A user's todos, always kept sorted by `order` ascending.
#[derive(Debug, Clone, Default)]
pub struct TodoList {
    items: Vec<Todo>,
    // highest order ever held this session; keeps next_order from reusing values
    high_water: i64,
}

impl TodoList {
    pub fn new() -> Self { Self::default() }

    /// Replaces the whole membership, e.g. after a fetch.
    pub fn reset(&mut self, todos: Vec<Todo>) {
        self.items = todos;
        self.bump_high_water();
        self.sort();
    }

    /// Inserts a todo. A saved todo whose id is already present replaces that entry.
    pub fn add(&mut self, todo: Todo) {
        let existing = todo
            .id
            .as_ref()
            .and_then(|id| self.items.iter().position(|t| t.id.as_ref() == Some(id)));
        match existing {
            Some(idx) => self.items[idx] = todo,
            None => self.items.push(todo),
        }
        self.bump_high_water();
        self.sort();
    }

    /// Removes a todo by identity. Absent items are ignored.
    pub fn remove(&mut self, cid: ClientId) -> Option<Todo> {
        let idx = self.items.iter().position(|t| t.cid() == cid)?;
        Some(self.items.remove(idx))
    }

    /// Applies `f` to one item and restores the sort invariant.
    pub fn update<F: FnOnce(&mut Todo)>(&mut self, cid: ClientId, f: F) -> Option<&Todo> {
        let todo = self.items.iter_mut().find(|t| t.cid() == cid)?;
        f(todo);
        self.bump_high_water();
        self.sort();
        self.get(cid)
    }

    pub fn get(&self, cid: ClientId) -> Option<&Todo> { self.items.iter().find(|t| t.cid() == cid) }

    pub fn find_by_id(&self, id: &TodoId) -> Option<&Todo> { self.items.iter().find(|t| t.id.as_ref() == Some(id)) }

    pub fn iter(&self) -> impl Iterator<Item = &Todo> { self.items.iter() }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn done(&self) -> Vec<&Todo> { self.items.iter().filter(|t| t.done).collect() }

    pub fn remaining(&self) -> Vec<&Todo> { self.items.iter().filter(|t| !t.done).collect() }

    /// Order for the next created todo: 1 on a fresh list, otherwise one past the
    /// highest order seen this session (removed items included).
    pub fn next_order(&self) -> i64 { self.high_water + 1 }

    pub fn stats(&self) -> Stats {
        let done = self.items.iter().filter(|t| t.done).count();
        let remaining = self.items.len() - done;
        Stats { total: self.items.len(), done, remaining, all_done: remaining == 0 }
    }

    fn bump_high_water(&mut self) {
        if let Some(max) = self.items.iter().map(|t| t.order).max() {
            self.high_water = self.high_water.max(max);
        }
    }

    // sort_by_key is stable, so equal orders keep insertion order
    fn sort(&mut self) { self.items.sort_by_key(|t| t.order); }
}
