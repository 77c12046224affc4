//! Service layer for task creation, retrieval, updates, and progress.

use super::error::{TaskLifecycleError, TaskLifecycleResult};
use crate::task::{
    domain::{
        ParseTaskStatusError, ProgressEntry, ProgressOutcome, Task, TaskChanges, TaskDetail,
        TaskDomainError, TaskDraft, TaskId, TaskStatus, TaskSummary, WorklogId,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default cap on the completed-task listing.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    category: String,
    description: Option<String>,
    targets: Option<String>,
    links: Option<String>,
    deadline: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            description: None,
            targets: None,
            links: None,
            deadline: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the targets.
    #[must_use]
    pub fn with_targets(mut self, targets: impl Into<String>) -> Self {
        self.targets = Some(targets.into());
        self
    }

    /// Sets the newline-separated links.
    #[must_use]
    pub fn with_links(mut self, links: impl Into<String>) -> Self {
        self.links = Some(links.into());
        self
    }

    /// Sets the deadline as an RFC 3339 timestamp with offset.
    #[must_use]
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }
}

/// Request payload for a field update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    category: Option<String>,
    description: Option<String>,
    targets: Option<String>,
    links: Option<String>,
    deadline: Option<String>,
}

impl UpdateTaskRequest {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Replaces the description; a blank value clears it.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replaces the targets; a blank value clears them.
    #[must_use]
    pub fn with_targets(mut self, targets: impl Into<String>) -> Self {
        self.targets = Some(targets.into());
        self
    }

    /// Replaces the links; a blank value clears them.
    #[must_use]
    pub fn with_links(mut self, links: impl Into<String>) -> Self {
        self.links = Some(links.into());
        self
    }

    /// Moves the deadline (RFC 3339 with offset).
    #[must_use]
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }
}

/// Request payload for a progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdateRequest {
    log_text: String,
    mark_as_done: bool,
    new_status: Option<String>,
    deadline: Option<String>,
    progress_note: Option<String>,
}

impl ProgressUpdateRequest {
    /// Creates a request carrying the worklog text.
    #[must_use]
    pub fn new(log_text: impl Into<String>) -> Self {
        Self {
            log_text: log_text.into(),
            mark_as_done: false,
            new_status: None,
            deadline: None,
            progress_note: None,
        }
    }

    /// Requests completion.
    #[must_use]
    pub const fn mark_as_done(mut self, mark_as_done: bool) -> Self {
        self.mark_as_done = mark_as_done;
        self
    }

    /// Requests a status change by its external name.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.new_status = Some(status.into());
        self
    }

    /// Moves the deadline (RFC 3339 with offset).
    #[must_use]
    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Attaches an annotation to the worklog.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.progress_note = Some(note.into());
        self
    }

    fn into_entry(self) -> TaskLifecycleResult<ProgressEntry> {
        let mut entry = ProgressEntry::new(self.log_text).marking_done(self.mark_as_done);
        if let Some(status) = parse_optional_status(self.new_status.as_deref())? {
            entry = entry.with_status(status);
        }
        if let Some(deadline) = self.deadline.as_deref().map(parse_deadline).transpose()? {
            entry = entry.with_deadline(deadline);
        }
        if let Some(note) = self.progress_note {
            entry = entry.with_note(note);
        }
        Ok(entry)
    }
}

/// Which slice of tasks a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskListFilter {
    /// `todo` and `in-progress` tasks.
    Active,
    /// Completed tasks.
    History,
    /// Active tasks in exactly this status.
    Status(TaskStatus),
}

impl TaskListFilter {
    /// Parses the external filter value.
    ///
    /// Accepts an empty value or `todo,in-progress` (either order) for the
    /// active listing and `done` for history.
    ///
    /// # Errors
    ///
    /// Returns [`ParseTaskStatusError`] for any other value.
    pub fn parse(value: &str) -> Result<Self, ParseTaskStatusError> {
        match value.trim() {
            "" | "todo,in-progress" | "in-progress,todo" => Ok(Self::Active),
            "done" => Ok(Self::History),
            other => Err(ParseTaskStatusError(other.to_owned())),
        }
    }

    /// Parses the command-line filter: anything [`Self::parse`] accepts, or
    /// a single status name. `done` selects history; `todo` and
    /// `in-progress` narrow the active listing to that status.
    ///
    /// # Errors
    ///
    /// Returns [`ParseTaskStatusError`] when the value is neither.
    pub fn parse_status(value: &str) -> Result<Self, ParseTaskStatusError> {
        Self::parse(value).or_else(|_| {
            TaskStatus::try_from(value).map(|status| match status {
                TaskStatus::Done => Self::History,
                TaskStatus::Todo | TaskStatus::InProgress => Self::Status(status),
            })
        })
    }
}

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    history_limit: usize,
}

impl<R, C> Clone for TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            history_limit: self.history_limit,
        }
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Overrides the completed-task listing cap.
    #[must_use]
    pub const fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Creates a new `todo` task.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title or category or a
    /// malformed deadline, and a repository error when persistence fails.
    pub async fn create(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let mut draft = TaskDraft::new(request.title, request.category)?;
        if let Some(description) = request.description {
            draft = draft.with_description(description);
        }
        if let Some(targets) = request.targets {
            draft = draft.with_targets(targets);
        }
        if let Some(links) = request.links {
            draft = draft.with_links(links);
        }
        if let Some(deadline) = request.deadline.as_deref().map(parse_deadline).transpose()? {
            draft = draft.with_deadline(deadline);
        }

        let task = Task::new(draft, &*self.clock);
        self.repository.store(&task).await?;
        info!(task_id = %task.id(), category = task.category(), "task created");
        Ok(task)
    }

    /// Retrieves a task together with its worklogs.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    pub async fn get(&self, id: TaskId) -> TaskLifecycleResult<TaskDetail> {
        debug!(task_id = %id, "loading task detail");
        let detail = self.repository.find_with_worklogs(id).await?;
        Ok(detail.ok_or(TaskRepositoryError::NotFound(id))?)
    }

    /// Lists active tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn list_active(&self) -> TaskLifecycleResult<Vec<TaskSummary>> {
        Ok(self.repository.list_active().await?)
    }

    /// Lists completed tasks, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn list_history(&self) -> TaskLifecycleResult<Vec<TaskSummary>> {
        Ok(self.repository.list_completed(self.history_limit).await?)
    }

    /// Lists tasks selected by `filter`.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn list(&self, filter: TaskListFilter) -> TaskLifecycleResult<Vec<TaskSummary>> {
        match filter {
            TaskListFilter::Active => self.list_active().await,
            TaskListFilter::History => self.list_history().await,
            TaskListFilter::Status(status) => {
                let mut tasks = self.list_active().await?;
                tasks.retain(|task| task.status == status);
                Ok(tasks)
            }
        }
    }

    /// Applies a field update to an open task.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown tasks, a conflict when the task
    /// is done, and a validation error for a blank category or malformed
    /// deadline.
    pub async fn update(
        &self,
        id: TaskId,
        request: UpdateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let changes = TaskChanges {
            category: request.category,
            description: request.description,
            targets: request.targets,
            links: request.links,
            deadline: request.deadline.as_deref().map(parse_deadline).transpose()?,
        };
        changes.validate()?;

        let task = self
            .repository
            .update_details(id, changes, self.clock.utc())
            .await
            .inspect_err(|err| log_rejection(id, err))?;
        info!(task_id = %id, "task updated");
        Ok(task)
    }

    /// Appends a worklog and applies the status transition rule.
    ///
    /// # Errors
    ///
    /// Returns a not-found error for unknown tasks and a conflict when the
    /// task is already done, ahead of any validation error for an unknown
    /// status, malformed deadline, or blank log text. Nothing is written
    /// when any of these is returned.
    pub async fn update_progress(
        &self,
        id: TaskId,
        request: ProgressUpdateRequest,
    ) -> TaskLifecycleResult<ProgressOutcome> {
        let entry = match request.into_entry() {
            Ok(entry) => entry,
            Err(err) => return Err(self.rank_rejection(id, err).await),
        };
        let outcome = self
            .repository
            .record_progress(id, entry, self.clock.utc())
            .await
            .inspect_err(|err| log_rejection(id, err))?;
        info!(
            task_id = %id,
            worklog_id = %outcome.worklog.id(),
            status = %outcome.task.status(),
            "progress recorded"
        );
        Ok(outcome)
    }

    /// Picks the error a malformed progress request reports. An unknown or
    /// completed task outranks bad input; only a read is made.
    async fn rank_rejection(
        &self,
        id: TaskId,
        invalid: TaskLifecycleError,
    ) -> TaskLifecycleError {
        match self.repository.find_by_id(id).await {
            Ok(Some(task)) if task.status().is_terminal() => {
                let conflict = TaskRepositoryError::Domain(TaskDomainError::TaskAlreadyDone(id));
                log_rejection(id, &conflict);
                conflict.into()
            }
            Ok(None) => TaskRepositoryError::NotFound(id).into(),
            Ok(Some(_)) => invalid,
            Err(err) => err.into(),
        }
    }

    /// Deletes a task and all of its worklogs.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not
    /// exist.
    pub async fn delete_task(&self, id: TaskId) -> TaskLifecycleResult<()> {
        self.repository.delete_task(id).await?;
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Deletes a single worklog.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::WorklogNotFound`] when the worklog does
    /// not exist.
    pub async fn delete_worklog(&self, id: WorklogId) -> TaskLifecycleResult<()> {
        self.repository.delete_worklog(id).await?;
        info!(worklog_id = %id, "worklog deleted");
        Ok(())
    }
}

fn log_rejection(id: TaskId, err: &TaskRepositoryError) {
    if let TaskRepositoryError::Domain(TaskDomainError::TaskAlreadyDone(_)) = err {
        warn!(task_id = %id, "rejected change to a done task");
    }
}

/// Parses an RFC 3339 timestamp with an explicit offset.
///
/// # Errors
///
/// Returns [`TaskDomainError::InvalidTimestamp`] when the value does not
/// parse.
pub fn parse_deadline(value: &str) -> Result<DateTime<Utc>, TaskDomainError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| TaskDomainError::InvalidTimestamp(value.to_owned()))
}

fn parse_optional_status(value: Option<&str>) -> Result<Option<TaskStatus>, ParseTaskStatusError> {
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(TaskStatus::try_from)
        .transpose()
}
