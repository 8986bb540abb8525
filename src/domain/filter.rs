use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::todo::Todo;
use super::todo_list::TodoList;

/// Which subset of the list is shown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    /// Route name, also the wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    pub fn apply(self, list: &TodoList) -> Vec<&Todo> {
        match self {
            Filter::All => list.iter().collect(),
            Filter::Active => list.remaining(),
            Filter::Completed => list.done(),
        }
    }

    /// Next filter in display order, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter `{0}`, expected one of all, active, completed")]
pub struct ParseFilterError(pub String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ParseFilterError(s.to_string()))
    }
}

/// Write side of navigation history.
pub trait Navigator {
    fn navigate(&mut self, filter: Filter);
}

/// In-memory navigation history with back/forward, the way a browser keeps it.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<Filter>,
    cursor: usize,
}

impl History {
    pub fn new() -> Self { Self::default() }

    pub fn current(&self) -> Option<Filter> { self.entries.get(self.cursor).copied() }

    pub fn entries(&self) -> &[Filter] { &self.entries }

    pub fn back(&mut self) -> Option<Filter> {
        if self.cursor == 0 { return None; }
        self.cursor -= 1;
        self.current()
    }

    pub fn forward(&mut self) -> Option<Filter> {
        if self.cursor + 1 >= self.entries.len() { return None; }
        self.cursor += 1;
        self.current()
    }
}

impl Navigator for History {
    /// Navigating to the entry already current is a no-op, like following a link to the page you are on.
    fn navigate(&mut self, filter: Filter) {
        if self.current() == Some(filter) { return; }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(filter);
        self.cursor = self.entries.len() - 1;
    }
}

/// Owns the current filter. Observers hold a [`watch::Receiver`]; dropping it
/// unsubscribes, dropping the controller closes every subscription.
#[derive(Debug)]
pub struct FilterController {
    tx: watch::Sender<Filter>,
}

impl Default for FilterController {
    fn default() -> Self { Self::new() }
}

impl FilterController {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Filter::All);
        Self { tx }
    }

    pub fn current(&self) -> Filter { *self.tx.borrow() }

    /// User picked a filter: change state and record it in history.
    pub fn select<N: Navigator + ?Sized>(&self, filter: Filter, navigator: &mut N) {
        self.set(filter);
        navigator.navigate(filter);
    }

    /// A route dispatched a filter: change state without writing history.
    pub fn route(&self, filter: Filter) { self.set(filter); }

    pub fn subscribe(&self) -> watch::Receiver<Filter> { self.tx.subscribe() }

    pub fn visible<'a>(&self, list: &'a TodoList) -> Vec<&'a Todo> { self.current().apply(list) }

    fn set(&self, filter: Filter) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == filter { return false; }
            *current = filter;
            true
        });
        if changed {
            tracing::debug!(%filter, "filter changed");
        }
    }
}
