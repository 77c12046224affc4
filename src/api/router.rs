//! Request routing from HTTP verbs and paths onto task services.

use super::envelope::Envelope;
use crate::task::{
    domain::{TaskId, WorklogId},
    ports::TaskRepository,
    services::{
        CreateTaskRequest, ErrorKind, ProgressUpdateRequest, TaskLifecycleError,
        TaskLifecycleService, TaskListFilter, TaskReportService, UpdateTaskRequest,
    },
};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error};

/// Path prefix shared by every route.
pub const API_PREFIX: &str = "/api/v1";

const JSON_CONTENT_TYPE: &str = "application/json";
const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";
const SERIALIZATION_FALLBACK: &str =
    r#"{"code":500,"msg":"failed to serialize response","data":null}"#;

/// HTTP verbs the router distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// Any other verb; never routed.
    Other,
}

/// Transport-independent request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ApiRequest {
    /// Builds a request from a verb and a request target such as
    /// `/api/v1/tasks?status=done`.
    #[must_use]
    pub fn new(method: HttpMethod, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            path: path.to_owned(),
            query: parse_query(query),
            body: Vec::new(),
        }
    }

    /// Attaches a request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the first value of query parameter `name`.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), Cow::into_owned)
}

/// Transport-independent response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// `Content-Type` header value.
    pub content_type: &'static str,
    /// Response body.
    pub body: String,
}

impl ApiResponse {
    fn json<T: Serialize>(status: u16, envelope: &Envelope<T>) -> Self {
        let body = serde_json::to_string(envelope).unwrap_or_else(|err| {
            error!(error = %err, "failed to serialize response");
            SERIALIZATION_FALLBACK.to_owned()
        });
        Self {
            status,
            content_type: JSON_CONTENT_TYPE,
            body,
        }
    }

    fn success<T: Serialize>(data: T) -> Self {
        Self::json(200, &Envelope::success(data))
    }

    /// Builds an error response whose envelope mirrors `status`.
    #[must_use]
    pub fn failure(status: u16, msg: impl Into<String>) -> Self {
        Self::json(status, &Envelope::<()>::failure(status, msg))
    }

    fn markdown(body: String) -> Self {
        Self {
            status: 200,
            content_type: MARKDOWN_CONTENT_TYPE,
            body,
        }
    }
}

/// Maps an error kind onto its HTTP status.
#[must_use]
pub const fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::Validation => 400,
        ErrorKind::NotFound => 404,
        ErrorKind::Conflict => 409,
        ErrorKind::Storage => 500,
    }
}

#[derive(Debug, Error)]
enum RouteError {
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("invalid status filter '{0}'")]
    InvalidFilter(String),
    #[error("route not found: {0}")]
    UnknownRoute(String),
    #[error(transparent)]
    Service(#[from] TaskLifecycleError),
}

impl RouteError {
    const fn status(&self) -> u16 {
        match self {
            Self::MalformedBody(_) | Self::InvalidFilter(_) => 400,
            Self::UnknownRoute(_) => 404,
            Self::Service(err) => status_for(err.kind()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateTaskBody {
    title: String,
    category: String,
    description: Option<String>,
    targets: Option<String>,
    links: Option<String>,
    deadline: Option<String>,
}

impl From<CreateTaskBody> for CreateTaskRequest {
    fn from(body: CreateTaskBody) -> Self {
        let mut request = Self::new(body.title, body.category);
        if let Some(description) = body.description {
            request = request.with_description(description);
        }
        if let Some(targets) = body.targets {
            request = request.with_targets(targets);
        }
        if let Some(links) = body.links {
            request = request.with_links(links);
        }
        if let Some(deadline) = body.deadline {
            request = request.with_deadline(deadline);
        }
        request
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateTaskBody {
    category: Option<String>,
    description: Option<String>,
    targets: Option<String>,
    links: Option<String>,
    deadline: Option<String>,
}

impl From<UpdateTaskBody> for UpdateTaskRequest {
    fn from(body: UpdateTaskBody) -> Self {
        let mut request = Self::new();
        if let Some(category) = body.category {
            request = request.with_category(category);
        }
        if let Some(description) = body.description {
            request = request.with_description(description);
        }
        if let Some(targets) = body.targets {
            request = request.with_targets(targets);
        }
        if let Some(links) = body.links {
            request = request.with_links(links);
        }
        if let Some(deadline) = body.deadline {
            request = request.with_deadline(deadline);
        }
        request
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProgressBody {
    log_text: String,
    mark_as_done: bool,
    new_status: Option<String>,
    deadline: Option<String>,
    progress_note: Option<String>,
}

impl From<ProgressBody> for ProgressUpdateRequest {
    fn from(body: ProgressBody) -> Self {
        let mut request = Self::new(body.log_text).mark_as_done(body.mark_as_done);
        if let Some(status) = body.new_status {
            request = request.with_status(status);
        }
        if let Some(deadline) = body.deadline {
            request = request.with_deadline(deadline);
        }
        if let Some(note) = body.progress_note {
            request = request.with_note(note);
        }
        request
    }
}

/// Routes API requests onto the task services.
pub struct ApiRouter<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    lifecycle: TaskLifecycleService<R, C>,
    reports: TaskReportService<R, C>,
}

impl<R, C> Clone for ApiRouter<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            reports: self.reports.clone(),
        }
    }
}

impl<R, C> ApiRouter<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a router over the given services.
    #[must_use]
    pub const fn new(lifecycle: TaskLifecycleService<R, C>, reports: TaskReportService<R, C>) -> Self {
        Self { lifecycle, reports }
    }

    /// Handles one request. Failures are rendered as error envelopes, so
    /// this never fails.
    pub async fn handle(&self, request: ApiRequest) -> ApiResponse {
        debug!(method = ?request.method, path = %request.path, "api request");
        match self.dispatch(&request).await {
            Ok(response) => response,
            Err(err) => {
                let status = err.status();
                if status >= 500 {
                    error!(error = %err, path = %request.path, "request failed");
                } else {
                    debug!(error = %err, status, "request rejected");
                }
                ApiResponse::failure(status, err.to_string())
            }
        }
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, RouteError> {
        let unknown = || RouteError::UnknownRoute(request.path.clone());
        let route = request.path.strip_prefix(API_PREFIX).ok_or_else(unknown)?;
        let segments: Vec<&str> = route.split('/').filter(|part| !part.is_empty()).collect();

        match (request.method, segments.as_slice()) {
            (HttpMethod::Post, ["tasks"]) => {
                let body: CreateTaskBody = parse_body(&request.body)?;
                Ok(ApiResponse::success(self.lifecycle.create(body.into()).await?))
            }
            (HttpMethod::Get, ["tasks"]) => {
                let raw = request.query_param("status").unwrap_or_default();
                let filter = TaskListFilter::parse(raw)
                    .map_err(|_| RouteError::InvalidFilter(raw.to_owned()))?;
                Ok(ApiResponse::success(self.lifecycle.list(filter).await?))
            }
            (HttpMethod::Get, ["tasks", id]) => {
                let detail = self.lifecycle.get(parse_id::<TaskId>(id)?).await?;
                Ok(ApiResponse::success(detail))
            }
            (HttpMethod::Patch, ["tasks", id]) => {
                let body: UpdateTaskBody = parse_body(&request.body)?;
                let task = self
                    .lifecycle
                    .update(parse_id::<TaskId>(id)?, body.into())
                    .await?;
                Ok(ApiResponse::success(task))
            }
            (HttpMethod::Delete, ["tasks", id]) => {
                self.lifecycle.delete_task(parse_id::<TaskId>(id)?).await?;
                Ok(ApiResponse::success(()))
            }
            (HttpMethod::Post, ["tasks", id, "progress"]) => {
                let body: ProgressBody = parse_body(&request.body)?;
                let outcome = self
                    .lifecycle
                    .update_progress(parse_id::<TaskId>(id)?, body.into())
                    .await?;
                Ok(ApiResponse::success(outcome))
            }
            (HttpMethod::Delete, ["worklogs", id]) => {
                self.lifecycle
                    .delete_worklog(parse_id::<WorklogId>(id)?)
                    .await?;
                Ok(ApiResponse::success(()))
            }
            (HttpMethod::Get, ["reports", "daily-summary"]) => {
                let summary = self
                    .reports
                    .daily_summary(request.query_param("date"))
                    .await?;
                Ok(ApiResponse::success(summary))
            }
            (HttpMethod::Get, ["reports", "stats"]) => {
                Ok(ApiResponse::success(self.reports.stats().await?))
            }
            (HttpMethod::Get, ["exports", "daily-markdown"]) => {
                let document = self
                    .reports
                    .export_daily_markdown(request.query_param("date"))
                    .await?;
                Ok(ApiResponse::markdown(document))
            }
            _ => Err(unknown()),
        }
    }
}

fn parse_body<T>(body: &[u8]) -> Result<T, RouteError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

fn parse_id<T>(raw: &str) -> Result<T, RouteError>
where
    T: FromStr<Err = crate::task::domain::TaskDomainError>,
{
    let decoded = decode_component(raw);
    T::from_str(&decoded).map_err(|err| RouteError::Service(err.into()))
}
