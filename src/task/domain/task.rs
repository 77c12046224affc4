//! Task aggregate root and the status state machine.

use super::{ParseTaskStatusError, TaskDomainError, TaskId, Worklog};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
///
/// `Todo` and `InProgress` are mutually reachable; both may move to `Done`,
/// which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Task has been created but work has not started.
    Todo,
    /// Task is being worked on.
    InProgress,
    /// Task has been completed.
    Done,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    /// Returns `true` for statuses that count as active work.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Todo | Self::InProgress)
    }

    /// Returns `true` when no further transitions are permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns `true` when moving from `self` to `next` is a real transition.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        !self.is_terminal() && self != next
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Self::Todo),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    category: String,
    description: Option<String>,
    targets: Option<String>,
    links: Option<String>,
    deadline: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Creates a draft with the required title and category.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::EmptyCategory`] when either is blank.
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        let title = require_text(title.into(), TaskDomainError::EmptyTitle)?;
        let category = require_text(category.into(), TaskDomainError::EmptyCategory)?;
        Ok(Self {
            title,
            category,
            description: None,
            targets: None,
            links: None,
            deadline: None,
        })
    }

    /// Sets the free-text description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = optional_text(description.into());
        self
    }

    /// Sets the free-text targets.
    #[must_use]
    pub fn with_targets(mut self, targets: impl Into<String>) -> Self {
        self.targets = optional_text(targets.into());
        self
    }

    /// Sets the newline-separated links.
    #[must_use]
    pub fn with_links(mut self, links: impl Into<String>) -> Self {
        self.links = optional_text(links.into());
        self
    }

    /// Sets the deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Subset of mutable task fields applied by a field update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    /// Replacement category.
    pub category: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement targets.
    pub targets: Option<String>,
    /// Replacement links.
    pub links: Option<String>,
    /// Replacement deadline.
    pub deadline: Option<DateTime<Utc>>,
}

impl TaskChanges {
    /// Checks the changes in isolation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyCategory`] when a blank category is
    /// supplied.
    pub fn validate(&self) -> Result<(), TaskDomainError> {
        match self.category.as_deref() {
            Some(category) if category.trim().is_empty() => Err(TaskDomainError::EmptyCategory),
            _ => Ok(()),
        }
    }
}

/// A single progress report against a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    log_text: String,
    progress_note: Option<String>,
    mark_as_done: bool,
    new_status: Option<TaskStatus>,
    deadline: Option<DateTime<Utc>>,
}

impl ProgressEntry {
    /// Creates an entry carrying the worklog text.
    #[must_use]
    pub fn new(log_text: impl Into<String>) -> Self {
        Self {
            log_text: log_text.into(),
            progress_note: None,
            mark_as_done: false,
            new_status: None,
            deadline: None,
        }
    }

    /// Requests completion of the task.
    #[must_use]
    pub const fn marking_done(mut self, mark_as_done: bool) -> Self {
        self.mark_as_done = mark_as_done;
        self
    }

    /// Requests a status change.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.new_status = Some(status);
        self
    }

    /// Attaches a short annotation to the worklog.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.progress_note = optional_text(note.into());
        self
    }

    /// Moves the task deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the worklog text.
    #[must_use]
    pub fn log_text(&self) -> &str {
        &self.log_text
    }

    /// Returns the status the task ends in when this entry is applied to a
    /// task currently in `current`.
    #[must_use]
    pub fn resolve_status(&self, current: TaskStatus) -> TaskStatus {
        if self.mark_as_done || self.new_status == Some(TaskStatus::Done) {
            return TaskStatus::Done;
        }
        match self.new_status {
            Some(requested) if current.can_transition_to(requested) => requested,
            _ => current,
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    category: String,
    description: Option<String>,
    targets: Option<String>,
    links: Option<String>,
    status: TaskStatus,
    deadline: Option<DateTime<Utc>>,
    actual_completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: String,
    /// Persisted category.
    pub category: String,
    /// Persisted description, if any.
    pub description: Option<String>,
    /// Persisted targets, if any.
    pub targets: Option<String>,
    /// Persisted links, if any.
    pub links: Option<String>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted deadline, if any.
    pub deadline: Option<DateTime<Utc>>,
    /// Persisted completion timestamp, if any.
    pub actual_completed_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `todo` task from a validated draft.
    #[must_use]
    pub fn new(draft: TaskDraft, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            title: draft.title,
            category: draft.category,
            description: draft.description,
            targets: draft.targets,
            links: draft.links,
            status: TaskStatus::Todo,
            deadline: draft.deadline,
            actual_completed_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            category: data.category,
            description: data.description,
            targets: data.targets,
            links: data.links,
            status: data.status,
            deadline: data.deadline,
            actual_completed_at: data.actual_completed_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the targets, if any.
    #[must_use]
    pub fn targets(&self) -> Option<&str> {
        self.targets.as_deref()
    }

    /// Returns the newline-separated links, if any.
    #[must_use]
    pub fn links(&self) -> Option<&str> {
        self.links.as_deref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns the completion timestamp, present only once the task is done.
    #[must_use]
    pub const fn actual_completed_at(&self) -> Option<DateTime<Utc>> {
        self.actual_completed_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the list projection of this task.
    #[must_use]
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            title: self.title.clone(),
            category: self.category.clone(),
            status: self.status,
        }
    }

    /// Applies a field update.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskAlreadyDone`] for completed tasks and
    /// [`TaskDomainError::EmptyCategory`] for a blank category. The task is
    /// left untouched on error.
    pub fn apply_changes(
        &mut self,
        changes: TaskChanges,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        changes.validate()?;

        if let Some(category) = changes.category {
            category.trim().clone_into(&mut self.category);
        }
        if let Some(description) = changes.description {
            self.description = optional_text(description);
        }
        if let Some(targets) = changes.targets {
            self.targets = optional_text(targets);
        }
        if let Some(links) = changes.links {
            self.links = optional_text(links);
        }
        if let Some(deadline) = changes.deadline {
            self.deadline = Some(deadline);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Applies a progress report, returning the worklog to persist with the
    /// updated task.
    ///
    /// The terminal-state check runs before anything else so a rejected
    /// report leaves the task untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskAlreadyDone`] for completed tasks and
    /// [`TaskDomainError::EmptyLogText`] for a blank log text.
    pub fn record_progress(
        &mut self,
        entry: ProgressEntry,
        now: DateTime<Utc>,
    ) -> Result<Worklog, TaskDomainError> {
        self.ensure_open()?;
        let next_status = entry.resolve_status(self.status);
        let worklog = Worklog::new(self.id, entry.log_text, entry.progress_note, now)?;

        if next_status == TaskStatus::Done {
            self.actual_completed_at = Some(now);
        }
        self.status = next_status;
        if let Some(deadline) = entry.deadline {
            self.deadline = Some(deadline);
        }
        self.updated_at = now;
        Ok(worklog)
    }

    fn ensure_open(&self) -> Result<(), TaskDomainError> {
        if self.status.is_terminal() {
            return Err(TaskDomainError::TaskAlreadyDone(self.id));
        }
        Ok(())
    }
}

/// List projection of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Task category.
    pub category: String,
    /// Task status.
    pub status: TaskStatus,
}

/// A task together with its worklogs in ascending creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDetail {
    /// The task record.
    #[serde(flatten)]
    pub task: Task,
    /// Worklogs ordered by creation time.
    pub logs: Vec<Worklog>,
}

/// Result of a successful progress update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressOutcome {
    /// The task after the update.
    pub task: Task,
    /// The worklog appended by the update.
    pub worklog: Worklog,
}

/// Trims `value`, returning `error` when nothing remains.
pub(crate) fn require_text(value: String, error: TaskDomainError) -> Result<String, TaskDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error);
    }
    Ok(trimmed.to_owned())
}

/// Maps blank text to `None`.
pub(crate) fn optional_text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
