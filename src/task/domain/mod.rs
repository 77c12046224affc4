//! Domain model for task tracking.
//!
//! Tasks, their worklogs, the status state machine, and the pure
//! aggregation behind daily summaries and statistics. Infrastructure
//! concerns stay outside this boundary.

mod error;
mod ids;
mod report;
mod task;
mod worklog;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{TaskId, WorklogId};
pub use report::{
    DATE_FORMAT, DailyActivity, DailyStats, DailySummary, DayWindow, TaskStats,
    group_by_first_occurrence, local_date, parse_calendar_date,
};
pub use task::{
    PersistedTaskData, ProgressEntry, ProgressOutcome, Task, TaskChanges, TaskDetail, TaskDraft,
    TaskStatus, TaskSummary,
};
pub use worklog::{PersistedWorklogData, Worklog};
