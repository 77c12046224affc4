//! Service-level errors and their transport-independent classification.

use crate::task::{
    domain::{ParseTaskStatusError, TaskDomainError},
    ports::TaskRepositoryError,
};
use thiserror::Error;

/// Coarse error classification shared by every transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or missing input.
    Validation,
    /// The referenced task or worklog does not exist.
    NotFound,
    /// The operation conflicts with the current state, e.g. a done task.
    Conflict,
    /// The store or renderer failed.
    Storage,
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// A status value outside the closed enumeration was supplied.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),
    /// A report template failed to render.
    #[error("failed to render report: {0}")]
    Render(#[from] minijinja::Error),
}

impl TaskLifecycleError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(err) => domain_kind(err),
            Self::Repository(err) => match err {
                TaskRepositoryError::NotFound(_) | TaskRepositoryError::WorklogNotFound(_) => {
                    ErrorKind::NotFound
                }
                TaskRepositoryError::DuplicateTask(_) => ErrorKind::Conflict,
                TaskRepositoryError::Domain(inner) => domain_kind(inner),
                TaskRepositoryError::Persistence(_) => ErrorKind::Storage,
            },
            Self::InvalidStatus(_) => ErrorKind::Validation,
            Self::Render(_) => ErrorKind::Storage,
        }
    }
}

const fn domain_kind(err: &TaskDomainError) -> ErrorKind {
    match err {
        TaskDomainError::TaskAlreadyDone(_) => ErrorKind::Conflict,
        // Identifiers that cannot exist are reported like absent ones.
        TaskDomainError::InvalidIdentifier(_) => ErrorKind::NotFound,
        TaskDomainError::EmptyTitle
        | TaskDomainError::EmptyCategory
        | TaskDomainError::EmptyLogText
        | TaskDomainError::InvalidDate(_)
        | TaskDomainError::InvalidTimestamp(_) => ErrorKind::Validation,
    }
}

/// Result type for task service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;
