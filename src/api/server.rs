//! Blocking `tiny_http` listener feeding the async router.

use super::router::{ApiRequest, ApiResponse, ApiRouter, HttpMethod};
use crate::task::ports::TaskRepository;
use mockable::Clock;
use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tiny_http::{Header, Method, Request, Response, Server};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Largest request body the server reads, in bytes.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Errors raised while running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying failure.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The accept loop task failed.
    #[error("server loop failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Unblocks a running [`ApiServer`] so that [`ApiServer::run`] returns.
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<Server>,
}

impl ShutdownHandle {
    /// Stops accepting requests.
    pub fn shutdown(&self) {
        self.server.unblock();
    }
}

/// HTTP front end for an [`ApiRouter`].
pub struct ApiServer<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    server: Arc<Server>,
    router: Arc<ApiRouter<R, C>>,
}

impl<R, C> ApiServer<R, C>
where
    R: TaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Binds the listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] when the address cannot be bound.
    pub fn bind(addr: &str, router: ApiRouter<R, C>) -> Result<Self, ServerError> {
        let server = Server::http(addr).map_err(|source| ServerError::Bind {
            addr: addr.to_owned(),
            source,
        })?;
        Ok(Self {
            server: Arc::new(server),
            router: Arc::new(router),
        })
    }

    /// Returns the bound socket address.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Returns a handle that stops the accept loop.
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
        }
    }

    /// Serves requests until the listener is unblocked.
    ///
    /// `tiny_http` accepts on a blocking thread; each request is then
    /// dispatched as its own task on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Join`] if the accept loop panics.
    pub async fn run(self) -> Result<(), ServerError> {
        let Self { server, router } = self;
        let runtime = Handle::current();
        if let Some(addr) = server.server_addr().to_ip() {
            info!(%addr, "api server listening");
        }

        tokio::task::spawn_blocking(move || {
            for mut request in server.incoming_requests() {
                let api_request = match read_request(&mut request) {
                    Ok(api_request) => api_request,
                    Err(err) => {
                        warn!(error = %err, "rejected request body");
                        respond(request, &err.response());
                        continue;
                    }
                };
                let request_router = Arc::clone(&router);
                runtime.spawn(async move {
                    let response = request_router.handle(api_request).await;
                    let sent =
                        tokio::task::spawn_blocking(move || respond(request, &response)).await;
                    if let Err(err) = sent {
                        warn!(error = %err, "response task failed");
                    }
                });
            }
        })
        .await?;

        info!("api server stopped");
        Ok(())
    }
}

#[derive(Debug, Error)]
enum BodyError {
    #[error("request body exceeds {MAX_BODY_BYTES} bytes")]
    TooLarge,
    #[error("unreadable request body: {0}")]
    Io(#[from] std::io::Error),
}

impl BodyError {
    fn response(&self) -> ApiResponse {
        match self {
            Self::TooLarge => ApiResponse::failure(413, "request body too large"),
            Self::Io(_) => ApiResponse::failure(400, "unreadable request body"),
        }
    }
}

fn read_request(request: &mut Request) -> Result<ApiRequest, BodyError> {
    let method = match request.method() {
        Method::Get => HttpMethod::Get,
        Method::Post => HttpMethod::Post,
        Method::Patch => HttpMethod::Patch,
        Method::Delete => HttpMethod::Delete,
        _ => HttpMethod::Other,
    };
    let body = read_body(request.as_reader(), MAX_BODY_BYTES)?;
    Ok(ApiRequest::new(method, request.url()).with_body(body))
}

/// Reads at most `limit` bytes; one byte more means the body is too large.
fn read_body(reader: impl Read, limit: u64) -> Result<Vec<u8>, BodyError> {
    let mut body = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if u64::try_from(body.len()).is_ok_and(|len| len <= limit) {
        Ok(body)
    } else {
        Err(BodyError::TooLarge)
    }
}

fn respond(request: Request, response: &ApiResponse) {
    let mut reply =
        Response::from_string(response.body.as_str()).with_status_code(response.status);
    if let Ok(header) = Header::from_bytes("Content-Type", response.content_type) {
        reply = reply.with_header(header);
    }
    if let Err(err) = request.respond(reply) {
        warn!(error = %err, "failed to send response");
    }
}
