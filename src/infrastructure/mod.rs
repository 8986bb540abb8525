pub mod sqlite;
pub mod sqlite_auth;
pub mod sqlite_repo;
