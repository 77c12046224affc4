//! Then steps for progress update BDD scenarios.

use super::world::{ProgressWorld, run_async};
use crate::test_helpers::{local_instant, work_day};
use chrono::{NaiveTime, Timelike};
use chronicle::task::{domain::TaskStatus, services::ErrorKind};
use rstest_bdd_macros::then;

fn failure_kind(world: &ProgressWorld) -> Result<ErrorKind, eyre::Report> {
    match world.last_update.as_ref() {
        Some(Err(err)) => Ok(err.kind()),
        Some(Ok(outcome)) => Err(eyre::eyre!(
            "expected the update to fail, but it logged {:?}",
            outcome.worklog
        )),
        None => Err(eyre::eyre!("no progress update was attempted")),
    }
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ProgressWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let detail = run_async(world.services.lifecycle.get(world.task()?.id()))?;

    if detail.task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            detail.task.status()
        ));
    }
    Ok(())
}

#[then(r#"the task was completed at "{time}""#)]
fn task_completed_at(world: &ProgressWorld, time: String) -> Result<(), eyre::Report> {
    let wall_clock = NaiveTime::parse_from_str(&time, "%H:%M")
        .map_err(|err| eyre::eyre!("invalid time {time:?} in scenario: {err}"))?;
    let expected = local_instant(work_day(), wall_clock.hour(), wall_clock.minute());
    let completed = world.task()?.actual_completed_at();

    if completed != Some(expected) {
        return Err(eyre::eyre!("expected completion at {expected}, found {completed:?}"));
    }
    Ok(())
}

#[then(r#"today's summary for "{title}" reads "{first}" then "{second}""#)]
fn summary_reads(
    world: &ProgressWorld,
    title: String,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    let summary = run_async(world.services.reports.daily_summary(None))?;
    let activity = summary
        .activities
        .iter()
        .find(|activity| activity.task_title == title)
        .ok_or_else(|| eyre::eyre!("no activity for {title:?} in {summary:?}"))?;

    if activity.today_logs != [first, second] {
        return Err(eyre::eyre!("unexpected logs {:?}", activity.today_logs));
    }
    Ok(())
}

#[then("the update fails with a conflict")]
fn update_conflicts(world: &ProgressWorld) -> Result<(), eyre::Report> {
    let kind = failure_kind(world)?;
    if kind != ErrorKind::Conflict {
        return Err(eyre::eyre!("expected a conflict, got {kind:?}"));
    }
    Ok(())
}

#[then("the update fails with a validation error")]
fn update_is_invalid(world: &ProgressWorld) -> Result<(), eyre::Report> {
    let kind = failure_kind(world)?;
    if kind != ErrorKind::Validation {
        return Err(eyre::eyre!("expected a validation error, got {kind:?}"));
    }
    Ok(())
}

#[then("the worklog count is {count:usize}")]
fn worklog_count_is(world: &ProgressWorld, count: usize) -> Result<(), eyre::Report> {
    let detail = run_async(world.services.lifecycle.get(world.task()?.id()))?;
    if detail.logs.len() != count {
        return Err(eyre::eyre!(
            "expected {count} worklogs, found {}",
            detail.logs.len()
        ));
    }
    Ok(())
}
