//! Application services for task orchestration and reporting.

mod error;
mod export;
mod lifecycle;
mod report;

pub use error::{ErrorKind, TaskLifecycleError, TaskLifecycleResult};
pub use export::render_daily_markdown;
pub use lifecycle::{
    CreateTaskRequest, DEFAULT_HISTORY_LIMIT, ProgressUpdateRequest, TaskLifecycleService,
    TaskListFilter, UpdateTaskRequest, parse_deadline,
};
pub use report::{DEFAULT_STATS_DAYS, TaskReportService};
