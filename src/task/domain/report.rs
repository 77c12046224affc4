//! Day-bucketed aggregation over tasks and worklogs.
//!
//! Calendar days are local-time days. Every function here is pure: callers
//! fetch the rows and pass them in, which keeps the aggregation identical
//! across storage adapters.

use super::{Task, TaskDomainError, TaskId, TaskStatus, Worklog};
use chrono::{DateTime, Days, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Format accepted for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an optional `YYYY-MM-DD` value, defaulting to `today`.
///
/// # Errors
///
/// Returns [`TaskDomainError::InvalidDate`] unless the value is exactly
/// `YYYY-MM-DD`.
pub fn parse_calendar_date(
    value: Option<&str>,
    today: NaiveDate,
) -> Result<NaiveDate, TaskDomainError> {
    match value.map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(today),
        // chrono accepts unpadded and signed fields; only the canonical
        // spelling is valid.
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .ok()
            .filter(|date| date.format(DATE_FORMAT).to_string() == raw)
            .ok_or_else(|| TaskDomainError::InvalidDate(raw.to_owned())),
    }
}

/// Half-open instant range `[start, end)` covering one local calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    date: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DayWindow {
    /// Builds the window starting at local midnight of `date` and spanning
    /// 24 hours.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidDate`] if no local instant maps to
    /// the start of the day.
    pub fn local(date: NaiveDate) -> Result<Self, TaskDomainError> {
        let midnight = date.and_time(NaiveTime::MIN);
        // A DST gap can swallow midnight; the day then starts an hour later.
        let start = Local
            .from_local_datetime(&midnight)
            .earliest()
            .or_else(|| {
                Local
                    .from_local_datetime(&(midnight + TimeDelta::hours(1)))
                    .earliest()
            })
            .ok_or_else(|| TaskDomainError::InvalidDate(date.format(DATE_FORMAT).to_string()))?
            .with_timezone(&Utc);

        Ok(Self {
            date,
            start,
            end: start + TimeDelta::hours(24),
        })
    }

    /// Returns the calendar date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the inclusive start instant.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the exclusive end instant.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns `true` when `instant` falls inside the window.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Returns the local calendar date of `instant`.
#[must_use]
pub fn local_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Groups worklogs by task in first-occurrence order.
///
/// Logs are ordered by creation time first; a task's position in the output
/// is fixed the first time one of its logs is seen.
#[must_use]
pub fn group_by_first_occurrence(worklogs: &[Worklog]) -> Vec<(TaskId, Vec<&Worklog>)> {
    let mut ordered: Vec<&Worklog> = worklogs.iter().collect();
    ordered.sort_by_key(|worklog| worklog.created_at());

    let mut positions: HashMap<TaskId, usize> = HashMap::new();
    let mut groups: Vec<(TaskId, Vec<&Worklog>)> = Vec::new();
    for worklog in ordered {
        let task_id = worklog.task_id();
        if let Some((_, logs)) = positions
            .get(&task_id)
            .and_then(|&index| groups.get_mut(index))
        {
            logs.push(worklog);
            continue;
        }
        positions.insert(task_id, groups.len());
        groups.push((task_id, vec![worklog]));
    }
    groups
}

/// Activity of one task within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    /// Task identifier.
    pub task_id: TaskId,
    /// Task title.
    pub task_title: String,
    /// Task category.
    pub category: String,
    /// Current task status.
    pub status: TaskStatus,
    /// `HH:MM - text` lines in ascending time order.
    pub today_logs: Vec<String>,
}

impl DailyActivity {
    /// Builds the activity entry for `task` from its logs of the day.
    #[must_use]
    pub fn new(task: &Task, logs: &[&Worklog]) -> Self {
        Self {
            task_id: task.id(),
            task_title: task.title().to_owned(),
            category: task.category().to_owned(),
            status: task.status(),
            today_logs: logs.iter().map(|log| log.timeline_line()).collect(),
        }
    }
}

/// Worklog activity of one local calendar day, grouped by task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// The summarised date.
    pub date: NaiveDate,
    /// Activities in first-occurrence order; empty when nothing was logged.
    pub activities: Vec<DailyActivity>,
}

/// Tasks created and completed on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// The calendar date.
    pub date: NaiveDate,
    /// Tasks completed that day.
    pub completed: u32,
    /// Tasks created that day.
    pub created: u32,
}

/// Aggregate counts over every task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    /// Number of tasks.
    pub total_tasks: u32,
    /// Number of done tasks.
    pub completed_tasks: u32,
    /// Number of todo tasks.
    pub todo_tasks: u32,
    /// Number of in-progress tasks.
    pub in_progress_tasks: u32,
    /// Task count per category.
    pub by_category: BTreeMap<String, u32>,
    /// `completed_tasks / total_tasks`, zero for an empty store.
    pub completion_rate: f64,
    /// Trailing per-day breakdown, oldest first.
    pub weekly_stats: Vec<DailyStats>,
}

impl TaskStats {
    /// Computes statistics over `tasks` with a trailing window of `days`
    /// local days ending at `today`.
    #[must_use]
    pub fn from_tasks(tasks: &[Task], today: NaiveDate, days: u32) -> Self {
        let mut stats = Self {
            total_tasks: 0,
            completed_tasks: 0,
            todo_tasks: 0,
            in_progress_tasks: 0,
            by_category: BTreeMap::new(),
            completion_rate: 0.0,
            weekly_stats: trailing_days(today, days)
                .into_iter()
                .map(|date| DailyStats {
                    date,
                    completed: 0,
                    created: 0,
                })
                .collect(),
        };

        for task in tasks {
            stats.total_tasks = stats.total_tasks.saturating_add(1);
            let counter = match task.status() {
                TaskStatus::Todo => &mut stats.todo_tasks,
                TaskStatus::InProgress => &mut stats.in_progress_tasks,
                TaskStatus::Done => &mut stats.completed_tasks,
            };
            *counter = counter.saturating_add(1);

            let per_category = stats
                .by_category
                .entry(task.category().to_owned())
                .or_insert(0);
            *per_category = per_category.saturating_add(1);

            let created_on = local_date(task.created_at());
            let completed_on = task.actual_completed_at().map(local_date);
            for day in &mut stats.weekly_stats {
                if day.date == created_on {
                    day.created = day.created.saturating_add(1);
                }
                if completed_on == Some(day.date) {
                    day.completed = day.completed.saturating_add(1);
                }
            }
        }

        stats.completion_rate = completion_rate(stats.completed_tasks, stats.total_tasks);
        stats
    }
}

#[expect(clippy::float_arithmetic, reason = "completion rate is a ratio of counts")]
fn completion_rate(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(completed) / f64::from(total)
}

fn trailing_days(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .collect()
}
