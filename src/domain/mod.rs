pub mod auth;
pub mod filter;
pub mod repository;
pub mod todo;
pub mod todo_list;
