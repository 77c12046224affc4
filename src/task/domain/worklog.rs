//! Worklog entries recorded against tasks.

use super::task::{optional_text, require_text};
use super::{TaskDomainError, TaskId, WorklogId};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A timestamped progress note attached to a task. Never mutated once
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worklog {
    id: WorklogId,
    task_id: TaskId,
    log_text: String,
    progress_note: Option<String>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted worklog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorklogData {
    /// Persisted worklog identifier.
    pub id: WorklogId,
    /// Owning task identifier.
    pub task_id: TaskId,
    /// Persisted log text.
    pub log_text: String,
    /// Persisted annotation, if any.
    pub progress_note: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Worklog {
    /// Creates a worklog for `task_id` stamped at `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyLogText`] when the text is blank.
    pub fn new(
        task_id: TaskId,
        log_text: String,
        progress_note: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        Ok(Self {
            id: WorklogId::new(),
            task_id,
            log_text: require_text(log_text, TaskDomainError::EmptyLogText)?,
            progress_note: progress_note.and_then(optional_text),
            created_at,
        })
    }

    /// Reconstructs a worklog from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorklogData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            log_text: data.log_text,
            progress_note: data.progress_note,
            created_at: data.created_at,
        }
    }

    /// Returns the worklog identifier.
    #[must_use]
    pub const fn id(&self) -> WorklogId {
        self.id
    }

    /// Returns the owning task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the log text.
    #[must_use]
    pub fn log_text(&self) -> &str {
        &self.log_text
    }

    /// Returns the annotation, if any.
    #[must_use]
    pub fn progress_note(&self) -> Option<&str> {
        self.progress_note.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Formats the entry as `HH:MM - text` in local time.
    #[must_use]
    pub fn timeline_line(&self) -> String {
        format!(
            "{} - {}",
            self.created_at.with_timezone(&Local).format("%H:%M"),
            self.log_text
        )
    }
}
