use std::path::Path;

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::domain::{auth::AuthError, repository::StoreError};

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self { StoreError::Backend(e.to_string()) }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self { AuthError::Backend(e.to_string()) }
}

/// Opens a pool. In-memory databases get a single connection so every query sees the same data.
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, sqlx::Error> {
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Makes sure a file-backed SQLite URL points at a file that exists.
pub fn prepare_sqlite_file(database_url: &str) -> std::io::Result<()> {
    if database_url.starts_with("sqlite::memory:") { return Ok(()); }
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        // On Windows, absolute paths may look like /C:/path; strip the leading slash
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        let path = path.split('?').next().unwrap_or(path);
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() { std::fs::create_dir_all(parent)?; }
        }
        if !p.exists() {
            std::fs::OpenOptions::new().create(true).append(true).open(p)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_errors_map_to_backend_variants() {
        assert!(matches!(StoreError::from(sqlx::Error::RowNotFound), StoreError::Backend(_)));
        assert!(matches!(AuthError::from(sqlx::Error::PoolClosed), AuthError::Backend(_)));
    }

    #[test]
    fn memory_url_is_left_alone() {
        assert!(prepare_sqlite_file("sqlite::memory:").is_ok());
    }

    #[test]
    fn creates_missing_file_and_parents() {
        let dir = std::env::temp_dir().join(format!("todos-{}", uuid::Uuid::new_v4()));
        let file = dir.join("nested").join("todos.db");
        prepare_sqlite_file(&format!("sqlite://{}", file.display())).unwrap();
        assert!(file.exists());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
