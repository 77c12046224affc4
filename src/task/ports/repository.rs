//! Repository port for task and worklog persistence.

use crate::task::domain::{
    ProgressEntry, ProgressOutcome, Task, TaskChanges, TaskDetail, TaskDomainError, TaskId,
    TaskSummary, Worklog, WorklogId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
///
/// Multi-step operations (`find_with_worklogs`, `record_progress`,
/// `update_details`, `delete_task`) are atomic: implementations either
/// commit every change or none.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Reads a task and its worklogs (ascending by creation time) from one
    /// consistent snapshot.
    async fn find_with_worklogs(&self, id: TaskId) -> TaskRepositoryResult<Option<TaskDetail>>;

    /// Lists `todo` and `in-progress` tasks, newest first.
    async fn list_active(&self) -> TaskRepositoryResult<Vec<TaskSummary>>;

    /// Lists at most `limit` done tasks, most recently completed first.
    async fn list_completed(&self, limit: usize) -> TaskRepositoryResult<Vec<TaskSummary>>;

    /// Lists done tasks whose completion falls in `[start, end)`, oldest
    /// completion first.
    async fn list_completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists every task.
    async fn list_all(&self) -> TaskRepositoryResult<Vec<Task>>;

    /// Lists worklogs created in `[start, end)`, ascending by creation time.
    async fn worklogs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Worklog>>;

    /// Lists the worklogs of one task, ascending by creation time.
    async fn worklogs_for(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Worklog>>;

    /// Appends a worklog and applies the progress transition atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for unknown tasks and
    /// [`TaskRepositoryError::Domain`] when the task is already done or the
    /// log text is blank. Nothing is written on error.
    async fn record_progress(
        &self,
        id: TaskId,
        entry: ProgressEntry,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<ProgressOutcome>;

    /// Applies a field update atomically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] for unknown tasks and
    /// [`TaskRepositoryError::Domain`] when the task is done or the changes
    /// are invalid.
    async fn update_details(
        &self,
        id: TaskId,
        changes: TaskChanges,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task>;

    /// Deletes a task together with its worklogs.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete_task(&self, id: TaskId) -> TaskRepositoryResult<()>;

    /// Deletes a single worklog.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::WorklogNotFound`] when the worklog does
    /// not exist.
    async fn delete_worklog(&self, id: WorklogId) -> TaskRepositoryResult<()>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The worklog was not found.
    #[error("worklog not found: {0}")]
    WorklogNotFound(WorklogId),

    /// A domain rule rejected the change inside the transaction.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
