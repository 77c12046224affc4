//! Diesel row models for task and worklog persistence.

use super::schema::{tasks, worklogs};
use chrono::NaiveDateTime;
use diesel::prelude::*;

/// Row model for task records, used for reads, inserts, and updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Task identifier.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Grouping label.
    pub category: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Free-text targets.
    pub targets: Option<String>,
    /// Newline-separated links.
    pub links: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Optional deadline (UTC).
    pub deadline: Option<NaiveDateTime>,
    /// Completion timestamp (UTC).
    pub actual_completed_at: Option<NaiveDateTime>,
    /// Creation timestamp (UTC).
    pub created_at: NaiveDateTime,
    /// Last mutation timestamp (UTC).
    pub updated_at: NaiveDateTime,
}

/// Row model for worklog records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = worklogs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorklogRow {
    /// Worklog identifier.
    pub id: String,
    /// Owning task identifier.
    pub task_id: String,
    /// What was done.
    pub log_text: String,
    /// Optional annotation.
    pub progress_note: Option<String>,
    /// Creation timestamp (UTC).
    pub created_at: NaiveDateTime,
}
