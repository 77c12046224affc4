//! Markdown rendering of a day's completed tasks.

use crate::task::domain::{DATE_FORMAT, Task, Worklog, local_date};
use chrono::{DateTime, Local, NaiveDate, Utc};
use minijinja::Environment;
use serde::Serialize;

const DAILY_MARKDOWN_TEMPLATE: &str = include_str!("templates/daily_markdown.md.j2");
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Serialize)]
struct ExportView<'a> {
    date: String,
    tasks: Vec<TaskView<'a>>,
}

#[derive(Debug, Serialize)]
struct TaskView<'a> {
    title: &'a str,
    category: &'a str,
    description: Option<&'a str>,
    targets: Option<&'a str>,
    links: Vec<&'a str>,
    deadline: Option<String>,
    created_at: String,
    completed_at: Option<String>,
    days: Vec<DayView<'a>>,
}

#[derive(Debug, Serialize)]
struct DayView<'a> {
    date: String,
    logs: Vec<LogView<'a>>,
}

#[derive(Debug, Serialize)]
struct LogView<'a> {
    time: String,
    text: &'a str,
    note: Option<&'a str>,
}

/// Renders `completed` (each task with all of its worklogs) as one Markdown
/// document for `date`.
///
/// # Errors
///
/// Returns the template engine error if rendering fails.
pub fn render_daily_markdown(
    date: NaiveDate,
    completed: &[(Task, Vec<Worklog>)],
) -> Result<String, minijinja::Error> {
    let view = ExportView {
        date: date.format(DATE_FORMAT).to_string(),
        tasks: completed
            .iter()
            .map(|(task, logs)| task_view(task, logs))
            .collect(),
    };
    Environment::new().render_str(DAILY_MARKDOWN_TEMPLATE, view)
}

fn task_view<'a>(task: &'a Task, logs: &'a [Worklog]) -> TaskView<'a> {
    TaskView {
        title: task.title(),
        category: task.category(),
        description: task.description(),
        targets: task.targets(),
        links: task
            .links()
            .map(|links| {
                links
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default(),
        deadline: task.deadline().map(format_local),
        created_at: format_local(task.created_at()),
        completed_at: task.actual_completed_at().map(format_local),
        days: group_by_local_date(logs),
    }
}

fn group_by_local_date(logs: &[Worklog]) -> Vec<DayView<'_>> {
    let mut ordered: Vec<&Worklog> = logs.iter().collect();
    ordered.sort_by_key(|log| log.created_at());

    let mut days: Vec<DayView<'_>> = Vec::new();
    for log in ordered {
        let date = local_date(log.created_at()).format(DATE_FORMAT).to_string();
        let entry = LogView {
            time: log
                .created_at()
                .with_timezone(&Local)
                .format("%H:%M")
                .to_string(),
            text: log.log_text(),
            note: log.progress_note(),
        };
        match days.last_mut() {
            Some(day) if day.date == date => day.logs.push(entry),
            _ => days.push(DayView {
                date,
                logs: vec![entry],
            }),
        }
    }
    days
}

fn format_local(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}
