//! Response envelope shared by every JSON endpoint.

use serde::{Deserialize, Serialize};

/// `code` value reported for successful responses.
pub const SUCCESS_CODE: u16 = 0;

/// `{code, msg, data}` wrapper; `code` is 0 on success and mirrors the HTTP
/// status otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Zero on success, otherwise the HTTP status.
    pub code: u16,
    /// Human-readable outcome.
    pub msg: String,
    /// Payload, absent on errors.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Wraps a successful payload.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            msg: "success".to_owned(),
            data: Some(data),
        }
    }

    /// Builds an error envelope for `status`.
    #[must_use]
    pub fn failure(status: u16, msg: impl Into<String>) -> Self {
        Self {
            code: status,
            msg: msg.into(),
            data: None,
        }
    }
}
