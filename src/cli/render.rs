//! Human-readable renderings of command results.

use crate::task::domain::{
    DailySummary, ProgressOutcome, Task, TaskDetail, TaskStats, TaskSummary,
};
use chrono::{DateTime, Local, Utc};
use std::io::{self, Write};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn local(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Writes one line per task.
///
/// # Errors
///
/// Propagates write failures.
pub fn task_list(out: &mut impl Write, tasks: &[TaskSummary]) -> io::Result<()> {
    if tasks.is_empty() {
        return writeln!(out, "no tasks");
    }
    for task in tasks {
        writeln!(
            out,
            "{}  {:<11}  {:<12}  {}",
            task.id, task.status, task.category, task.title
        )?;
    }
    Ok(())
}

/// Writes the fields of a single task.
///
/// # Errors
///
/// Propagates write failures.
pub fn task(out: &mut impl Write, task: &Task) -> io::Result<()> {
    writeln!(out, "{}", task.title())?;
    writeln!(out, "  id:          {}", task.id())?;
    writeln!(out, "  status:      {}", task.status())?;
    writeln!(out, "  category:    {}", task.category())?;
    if let Some(deadline) = task.deadline() {
        writeln!(out, "  deadline:    {}", local(deadline))?;
    }
    writeln!(out, "  created:     {}", local(task.created_at()))?;
    if let Some(completed) = task.actual_completed_at() {
        writeln!(out, "  completed:   {}", local(completed))?;
    }
    if let Some(description) = task.description() {
        writeln!(out, "  description: {description}")?;
    }
    if let Some(targets) = task.targets() {
        writeln!(out, "  targets:     {targets}")?;
    }
    if let Some(links) = task.links() {
        for link in links.lines().filter(|line| !line.trim().is_empty()) {
            writeln!(out, "  link:        {}", link.trim())?;
        }
    }
    Ok(())
}

/// Writes a task followed by its worklogs.
///
/// # Errors
///
/// Propagates write failures.
pub fn task_detail(out: &mut impl Write, detail: &TaskDetail) -> io::Result<()> {
    task(out, &detail.task)?;
    if detail.logs.is_empty() {
        return writeln!(out, "  (no worklogs)");
    }
    writeln!(out, "worklogs:")?;
    for log in &detail.logs {
        match log.progress_note() {
            Some(note) => writeln!(
                out,
                "  {}  {}  ({note})  [{}]",
                local(log.created_at()),
                log.log_text(),
                log.id()
            )?,
            None => writeln!(
                out,
                "  {}  {}  [{}]",
                local(log.created_at()),
                log.log_text(),
                log.id()
            )?,
        }
    }
    Ok(())
}

/// Writes the result of a progress update.
///
/// # Errors
///
/// Propagates write failures.
pub fn progress(out: &mut impl Write, outcome: &ProgressOutcome) -> io::Result<()> {
    writeln!(
        out,
        "logged {} on '{}' ({})",
        outcome.worklog.id(),
        outcome.task.title(),
        outcome.task.status()
    )
}

/// Writes a daily summary grouped by task.
///
/// # Errors
///
/// Propagates write failures.
pub fn daily_summary(out: &mut impl Write, summary: &DailySummary) -> io::Result<()> {
    writeln!(out, "{}", summary.date)?;
    if summary.activities.is_empty() {
        return writeln!(out, "  no activity");
    }
    for activity in &summary.activities {
        writeln!(
            out,
            "  {} [{}] ({})",
            activity.task_title, activity.category, activity.status
        )?;
        for line in &activity.today_logs {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}

/// Writes aggregate statistics.
///
/// # Errors
///
/// Propagates write failures.
#[expect(clippy::float_arithmetic, reason = "completion is shown as a percentage")]
pub fn stats(out: &mut impl Write, stats: &TaskStats) -> io::Result<()> {
    writeln!(out, "total:       {}", stats.total_tasks)?;
    writeln!(out, "todo:        {}", stats.todo_tasks)?;
    writeln!(out, "in-progress: {}", stats.in_progress_tasks)?;
    writeln!(out, "done:        {}", stats.completed_tasks)?;
    writeln!(out, "completion:  {:.1}%", stats.completion_rate * 100.0)?;
    if !stats.by_category.is_empty() {
        writeln!(out, "by category:")?;
        for (category, count) in &stats.by_category {
            writeln!(out, "  {category}: {count}")?;
        }
    }
    writeln!(out, "last {} days (created/completed):", stats.weekly_stats.len())?;
    for day in &stats.weekly_stats {
        writeln!(out, "  {}  {}/{}", day.date, day.created, day.completed)?;
    }
    Ok(())
}
