//! Command-line errors and exit codes.

use crate::api::ServerError;
use crate::config::ConfigError;
use crate::task::ports::TaskRepositoryError;
use crate::task::services::{ErrorKind, TaskLifecycleError};
use thiserror::Error;

/// Errors surfaced by command execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The store could not be opened.
    #[error("failed to open store: {0}")]
    Store(#[from] TaskRepositoryError),
    /// A task operation failed.
    #[error(transparent)]
    Service(#[from] TaskLifecycleError),
    /// The HTTP server failed.
    #[error(transparent)]
    Server(#[from] ServerError),
    /// Output could not be serialized.
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit status: 2 validation, 3 not found, 4 conflict, 1
    /// otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Service(err) => match err.kind() {
                ErrorKind::Validation => 2,
                ErrorKind::NotFound => 3,
                ErrorKind::Conflict => 4,
                ErrorKind::Storage => 1,
            },
            Self::Config(_) | Self::Store(_) | Self::Server(_) | Self::Json(_) | Self::Io(_) => 1,
        }
    }
}
