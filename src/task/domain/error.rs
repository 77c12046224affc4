//! Error types for task domain validation and parsing.

use super::TaskId;
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task category is empty after trimming.
    #[error("task category must not be empty")]
    EmptyCategory,

    /// The worklog text is empty after trimming.
    #[error("worklog text must not be empty")]
    EmptyLogText,

    /// A calendar date did not match `YYYY-MM-DD`.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A timestamp did not parse as RFC 3339 with an explicit offset.
    #[error("invalid timestamp '{0}', expected RFC 3339 with a time zone offset")]
    InvalidTimestamp(String),

    /// An identifier did not parse as a UUID.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// The task reached the terminal `done` state and rejects mutation.
    #[error("task is already done: {0}")]
    TaskAlreadyDone(TaskId),
}

/// Error returned while parsing task statuses from input or persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
