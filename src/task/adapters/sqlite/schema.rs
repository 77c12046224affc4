//! Diesel schema for task and worklog persistence.
//!
//! Timestamps are stored as UTC `TIMESTAMP` text; identifiers as UUID text.

diesel::table! {
    /// Task records.
    tasks (id) {
        /// Task identifier.
        id -> Text,
        /// Short title.
        title -> Text,
        /// Grouping label.
        category -> Text,
        /// Free-text description.
        description -> Nullable<Text>,
        /// Free-text targets.
        targets -> Nullable<Text>,
        /// Newline-separated links.
        links -> Nullable<Text>,
        /// Lifecycle status.
        status -> Text,
        /// Optional deadline.
        deadline -> Nullable<Timestamp>,
        /// Completion timestamp, set once the task is done.
        actual_completed_at -> Nullable<Timestamp>,
        /// Creation timestamp.
        created_at -> Timestamp,
        /// Last mutation timestamp.
        updated_at -> Timestamp,
    }
}

diesel::table! {
    /// Append-only worklog entries.
    worklogs (id) {
        /// Worklog identifier.
        id -> Text,
        /// Owning task identifier.
        task_id -> Text,
        /// What was done.
        log_text -> Text,
        /// Optional annotation.
        progress_note -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamp,
    }
}

diesel::joinable!(worklogs -> tasks (task_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, worklogs);

/// DDL applied when a store is opened. Idempotent.
pub(super) const CREATE_SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    category TEXT NOT NULL,
    description TEXT,
    targets TEXT,
    links TEXT,
    status TEXT NOT NULL DEFAULT 'todo'
        CHECK (status IN ('todo', 'in-progress', 'done')),
    deadline TIMESTAMP,
    actual_completed_at TIMESTAMP,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);
CREATE TABLE IF NOT EXISTS worklogs (
    id TEXT PRIMARY KEY NOT NULL,
    task_id TEXT NOT NULL REFERENCES tasks (id) ON DELETE CASCADE,
    log_text TEXT NOT NULL,
    progress_note TEXT,
    created_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status);
CREATE INDEX IF NOT EXISTS idx_worklogs_task_id ON worklogs (task_id);
CREATE INDEX IF NOT EXISTS idx_worklogs_created_at ON worklogs (created_at);
";
