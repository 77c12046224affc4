//! HTTP JSON API.
//!
//! [`ApiRouter`] maps transport-independent requests onto the task services
//! and wraps every JSON payload in an [`Envelope`]. [`ApiServer`] feeds it
//! from a `tiny_http` listener.

mod envelope;
mod router;
mod server;

pub use envelope::{Envelope, SUCCESS_CODE};
pub use router::{API_PREFIX, ApiRequest, ApiResponse, ApiRouter, HttpMethod, status_for};
pub use server::{ApiServer, ServerError, ShutdownHandle};
