//! Read-only reporting over tasks and worklogs.

use super::{error::TaskLifecycleResult, export::render_daily_markdown};
use crate::task::{
    domain::{
        DailyActivity, DailySummary, DayWindow, Task, TaskStats, Worklog,
        group_by_first_occurrence, parse_calendar_date,
    },
    ports::TaskRepository,
};
use chrono::NaiveDate;
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Default length of the trailing statistics window, in days.
pub const DEFAULT_STATS_DAYS: u32 = 7;

/// Daily summaries, statistics, and exports.
pub struct TaskReportService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    stats_days: u32,
}

impl<R, C> Clone for TaskReportService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            stats_days: self.stats_days,
        }
    }
}

impl<R, C> TaskReportService<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new report service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            stats_days: DEFAULT_STATS_DAYS,
        }
    }

    /// Overrides the trailing statistics window.
    #[must_use]
    pub const fn with_stats_days(mut self, stats_days: u32) -> Self {
        self.stats_days = stats_days;
        self
    }

    fn resolve_date(&self, date: Option<&str>) -> TaskLifecycleResult<NaiveDate> {
        let today = self.clock.local().date_naive();
        Ok(parse_calendar_date(date, today)?)
    }

    /// Summarises worklog activity for a local calendar day, today when
    /// `date` is absent.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed date and a repository
    /// error when a lookup fails.
    pub async fn daily_summary(&self, date: Option<&str>) -> TaskLifecycleResult<DailySummary> {
        let window = DayWindow::local(self.resolve_date(date)?)?;
        let worklogs = self
            .repository
            .worklogs_between(window.start(), window.end())
            .await?;

        let mut activities = Vec::new();
        for (task_id, logs) in group_by_first_occurrence(&worklogs) {
            // A task deleted between the two reads has nothing left to show.
            if let Some(task) = self.repository.find_by_id(task_id).await? {
                activities.push(DailyActivity::new(&task, &logs));
            }
        }
        debug!(date = %window.date(), activities = activities.len(), "daily summary built");

        Ok(DailySummary {
            date: window.date(),
            activities,
        })
    }

    /// Computes aggregate statistics over every task.
    ///
    /// # Errors
    ///
    /// Returns a repository error when the lookup fails.
    pub async fn stats(&self) -> TaskLifecycleResult<TaskStats> {
        let tasks = self.repository.list_all().await?;
        let today = self.clock.local().date_naive();
        Ok(TaskStats::from_tasks(&tasks, today, self.stats_days))
    }

    /// Renders the tasks completed on a local calendar day as Markdown.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed date, a repository error
    /// when a lookup fails, and a render error if the template fails.
    pub async fn export_daily_markdown(&self, date: Option<&str>) -> TaskLifecycleResult<String> {
        let window = DayWindow::local(self.resolve_date(date)?)?;
        let tasks = self
            .repository
            .list_completed_between(window.start(), window.end())
            .await?;

        let mut completed: Vec<(Task, Vec<Worklog>)> = Vec::with_capacity(tasks.len());
        for task in tasks {
            let logs = self.repository.worklogs_for(task.id()).await?;
            completed.push((task, logs));
        }
        Ok(render_daily_markdown(window.date(), &completed)?)
    }
}
