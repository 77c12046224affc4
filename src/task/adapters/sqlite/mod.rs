//! `SQLite` adapter for task and worklog persistence.

mod models;
mod repository;
mod schema;

pub use repository::{SqliteOptions, SqliteTaskRepository, TaskSqlitePool};
