use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Pool, Row, Sqlite};
use uuid::Uuid;

use crate::domain::{
    repository::{StoreError, TodoRepository},
    todo::{Todo, TodoId, UserId},
};

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self { Self { pool: Arc::new(pool) } }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(super::sqlite::connect(database_url).await?))
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                content TEXT NOT NULL,
                done INTEGER NOT NULL,
                ord INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS todos_owner ON todos (owner)")
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_all(&self, owner: &UserId) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query("SELECT id, owner, content, done, ord FROM todos WHERE owner = ?1 ORDER BY ord ASC")
            .bind(owner.0.to_string())
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn save(&self, todo: &Todo) -> Result<TodoId, StoreError> {
        let now = Utc::now().to_rfc3339();
        match &todo.id {
            None => {
                let id = TodoId(Uuid::new_v4());
                sqlx::query(
                    "INSERT INTO todos (id, owner, content, done, ord, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .bind(id.0.to_string())
                .bind(todo.owner().0.to_string())
                .bind(&todo.content)
                .bind(todo.done)
                .bind(todo.order)
                .bind(&now)
                .bind(&now)
                .execute(&*self.pool)
                .await?;
                Ok(id)
            }
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE todos SET content = ?3, done = ?4, ord = ?5, updated_at = ?6 WHERE id = ?1 AND owner = ?2",
                )
                .bind(id.0.to_string())
                .bind(todo.owner().0.to_string())
                .bind(&todo.content)
                .bind(todo.done)
                .bind(todo.order)
                .bind(&now)
                .execute(&*self.pool)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::NotFound(id.clone()));
                }
                Ok(id.clone())
            }
        }
    }

    async fn destroy(&self, todo: &Todo) -> Result<bool, StoreError> {
        let Some(id) = &todo.id else { return Ok(false) };
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1 AND owner = ?2")
            .bind(id.0.to_string())
            .bind(todo.owner().0.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_todo(row: SqliteRow) -> Result<Todo, StoreError> {
    let id_str: String = row.try_get("id")?;
    let owner_str: String = row.try_get("owner")?;
    let content: String = row.try_get("content")?;
    let done: bool = row.try_get("done")?;
    let order: i64 = row.try_get("ord")?;

    let id = Uuid::parse_str(&id_str).map_err(|e| StoreError::Corrupt(format!("todo id {id_str}: {e}")))?;
    let owner = Uuid::parse_str(&owner_str).map_err(|e| StoreError::Corrupt(format!("owner {owner_str}: {e}")))?;
    Ok(Todo::restore(TodoId(id), content, done, order, UserId(owner)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn save_fetch_update_destroy() {
        let repo = repo().await;
        let owner = UserId(Uuid::new_v4());
        let mut todo = Todo::new("Buy milk", 1, owner.clone());
        let id = repo.save(&todo).await.unwrap();
        todo.id = Some(id.clone());

        todo.toggle_done();
        todo.edit_content("");
        assert_eq!(repo.save(&todo).await.unwrap(), id);

        let fetched = repo.fetch_all(&owner).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].id, Some(id));
        assert_eq!(fetched[0].content, "");
        assert!(fetched[0].done);
        assert_eq!(fetched[0].order, 1);

        assert!(repo.destroy(&todo).await.unwrap());
        assert!(!repo.destroy(&todo).await.unwrap());
        assert!(repo.fetch_all(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_owners_cannot_see_or_touch() {
        let repo = repo().await;
        let owner = UserId(Uuid::new_v4());
        let mut todo = Todo::new("private", 1, owner.clone());
        todo.id = Some(repo.save(&todo).await.unwrap());

        let intruder = UserId(Uuid::new_v4());
        assert!(repo.fetch_all(&intruder).await.unwrap().is_empty());

        let forged = Todo::restore(todo.id.clone().unwrap(), "mine now".into(), true, 1, intruder);
        assert!(matches!(repo.save(&forged).await, Err(StoreError::NotFound(_))));
        assert!(!repo.destroy(&forged).await.unwrap());
        assert_eq!(repo.fetch_all(&owner).await.unwrap()[0].content, "private");
    }

    #[tokio::test]
    async fn unsaved_destroy_is_a_noop() {
        let repo = repo().await;
        let todo = Todo::new("x", 1, UserId(Uuid::new_v4()));
        assert!(!repo.destroy(&todo).await.unwrap());
    }
}
