use crate::domain::filter::{Filter, FilterController, History};
use crate::domain::repository::{StoreError, TodoRepository};
use crate::domain::todo::{ClientId, Todo, User};
use crate::domain::todo_list::{Stats, TodoList};

/// The authenticated view: one user's list, its filter and navigation history.
///
/// Local state changes first and the store is written afterwards. A failed write
/// is logged and returned; toggle/edit/delete are not rolled back or retried.
pub struct ManageTodos<R: TodoRepository> {
    repo: R,
    user: User,
    todos: TodoList,
    filter: FilterController,
    history: History,
}

impl<R: TodoRepository> ManageTodos<R> {
    pub fn new(repo: R, user: User) -> Self {
        Self { repo, user, todos: TodoList::new(), filter: FilterController::new(), history: History::new() }
    }

    /// Fetches every todo of the current user, replacing the local list.
    pub async fn load(&mut self) -> Result<(), StoreError> {
        let todos = self.repo.fetch_all(&self.user.id).await?;
        tracing::info!(user = %self.user.username, count = todos.len(), "todos loaded");
        self.todos.reset(todos);
        Ok(())
    }

    pub fn user(&self) -> &User { &self.user }

    pub fn todos(&self) -> &TodoList { &self.todos }

    pub fn filter(&self) -> &FilterController { &self.filter }

    pub fn history(&self) -> &History { &self.history }

    pub fn visible(&self) -> Vec<&Todo> { self.filter.visible(&self.todos) }

    pub fn stats(&self) -> Stats { self.todos.stats() }

    /// Creates a todo at the end of the list and resets the filter to `all`.
    /// A failed save removes the provisional item again.
    pub async fn create(&mut self, content: &str) -> Result<ClientId, StoreError> {
        let todo = Todo::new(content, self.todos.next_order(), self.user.id.clone());
        let cid = todo.cid();
        self.todos.add(todo.clone());
        self.select_filter(Filter::All);

        match self.repo.save(&todo).await {
            Ok(id) => {
                tracing::debug!(%cid, %id, order = todo.order, "todo created");
                self.todos.update(cid, |t| t.id = Some(id));
                Ok(cid)
            }
            Err(e) => {
                tracing::warn!(%cid, error = %e, "failed to create todo");
                self.todos.remove(cid);
                Err(e)
            }
        }
    }

    /// Flips `done`. Returns `Ok(false)` when the item is not in the list.
    pub async fn toggle(&mut self, cid: ClientId) -> Result<bool, StoreError> {
        let Some(todo) = self.todos.update(cid, Todo::toggle_done).cloned() else { return Ok(false) };
        tracing::debug!(%cid, done = todo.done, "todo toggled");
        self.persist(&todo, "toggle").await?;
        Ok(true)
    }

    /// Replaces the content; empty content is kept as is.
    pub async fn edit(&mut self, cid: ClientId, content: &str) -> Result<bool, StoreError> {
        let Some(todo) = self.todos.update(cid, |t| t.edit_content(content)).cloned() else { return Ok(false) };
        tracing::debug!(%cid, "todo edited");
        self.persist(&todo, "edit").await?;
        Ok(true)
    }

    /// Deletes one todo.
    pub async fn clear(&mut self, cid: ClientId) -> Result<bool, StoreError> {
        let Some(todo) = self.todos.remove(cid) else { return Ok(false) };
        tracing::debug!(%cid, "todo removed");
        if let Err(e) = self.repo.destroy(&todo).await {
            tracing::warn!(%cid, error = %e, "failed to destroy todo");
            return Err(e);
        }
        Ok(true)
    }

    /// Deletes every completed todo. Every item is attempted; the first failure is returned.
    pub async fn clear_completed(&mut self) -> Result<usize, StoreError> {
        let done: Vec<ClientId> = self.todos.done().iter().map(|t| t.cid()).collect();
        let mut first_err = None;
        for cid in &done {
            if let Err(e) = self.clear(*cid).await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(done.len()),
        }
    }

    /// Sets `done` on every item. Every item is attempted; the first failure is returned.
    pub async fn toggle_all(&mut self, done: bool) -> Result<usize, StoreError> {
        let cids: Vec<ClientId> = self.todos.iter().map(Todo::cid).collect();
        let mut first_err = None;
        for cid in &cids {
            let Some(todo) = self.todos.update(*cid, |t| t.done = done).cloned() else { continue };
            if let Err(e) = self.persist(&todo, "toggle all").await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(cids.len()),
        }
    }

    /// User picked a filter; recorded in history.
    pub fn select_filter(&mut self, filter: Filter) { self.filter.select(filter, &mut self.history); }

    /// Route dispatch; history is left alone.
    pub fn route(&mut self, filter: Filter) { self.filter.route(filter); }

    pub fn back(&mut self) -> Option<Filter> {
        let filter = self.history.back()?;
        self.route(filter);
        Some(filter)
    }

    pub fn forward(&mut self) -> Option<Filter> {
        let filter = self.history.forward()?;
        self.route(filter);
        Some(filter)
    }

    async fn persist(&self, todo: &Todo, op: &'static str) -> Result<(), StoreError> {
        if let Err(e) = self.repo.save(todo).await {
            tracing::warn!(cid = %todo.cid(), op, error = %e, "failed to save todo");
            return Err(e);
        }
        Ok(())
    }
}
