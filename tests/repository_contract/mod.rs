//! Behaviour every `TaskRepository` implementation must share.
//!
//! Each check takes a fresh, empty repository and returns an error report
//! describing the first violated expectation.

use crate::test_helpers::{local_instant, work_day};
use chrono::{DateTime, TimeDelta, Utc};
use chronicle::task::{
    domain::{
        PersistedTaskData, ProgressEntry, Task, TaskChanges, TaskDomainError, TaskId, TaskStatus,
        WorklogId,
    },
    ports::{TaskRepository, TaskRepositoryError},
};
use eyre::{bail, ensure};

fn task_created_at(title: &str, created_at: DateTime<Utc>) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        title: title.to_owned(),
        category: "contract".to_owned(),
        description: Some("stored verbatim".to_owned()),
        targets: None,
        links: Some("https://example.com/a\nhttps://example.com/b".to_owned()),
        status: TaskStatus::Todo,
        deadline: Some(created_at + TimeDelta::days(2)),
        actual_completed_at: None,
        created_at,
        updated_at: created_at,
    })
}

async fn stored(
    repository: &impl TaskRepository,
    title: &str,
    hour: u32,
) -> eyre::Result<Task> {
    let task = task_created_at(title, local_instant(work_day(), hour, 0));
    repository.store(&task).await?;
    Ok(task)
}

pub async fn stored_task_round_trips(repository: &impl TaskRepository) -> eyre::Result<()> {
    let task = stored(repository, "Round trip", 8).await?;

    let found = repository.find_by_id(task.id()).await?;
    ensure!(found.as_ref() == Some(&task), "found {found:?}");
    let missing = repository.find_by_id(TaskId::new()).await?;
    ensure!(missing.is_none(), "unknown id should be absent");
    Ok(())
}

pub async fn duplicate_task_is_rejected(repository: &impl TaskRepository) -> eyre::Result<()> {
    let task = stored(repository, "Original", 8).await?;

    let result = repository.store(&task).await;

    let Err(TaskRepositoryError::DuplicateTask(id)) = result else {
        bail!("expected duplicate error, got {result:?}");
    };
    ensure!(id == task.id(), "duplicate error names the task");
    Ok(())
}

pub async fn worklogs_come_back_in_time_order(
    repository: &impl TaskRepository,
) -> eyre::Result<()> {
    let task = stored(repository, "Ordered", 8).await?;
    for (text, hour) in [("second", 11), ("first", 9), ("third", 15)] {
        repository
            .record_progress(
                task.id(),
                ProgressEntry::new(text),
                local_instant(work_day(), hour, 0),
            )
            .await?;
    }

    let Some(detail) = repository.find_with_worklogs(task.id()).await? else {
        bail!("task should exist");
    };
    let texts: Vec<&str> = detail.logs.iter().map(|log| log.log_text()).collect();
    ensure!(texts == ["first", "second", "third"], "logs were {texts:?}");
    ensure!(
        detail.task.updated_at() == local_instant(work_day(), 15, 0),
        "updated_at follows the last write"
    );
    let for_task = repository.worklogs_for(task.id()).await?;
    ensure!(for_task == detail.logs, "worklogs_for agrees with the detail view");
    Ok(())
}

pub async fn worklog_window_is_half_open(repository: &impl TaskRepository) -> eyre::Result<()> {
    let task = stored(repository, "Windowed", 8).await?;
    let start = local_instant(work_day(), 10, 0);
    let end = local_instant(work_day(), 12, 0);
    for instant in [start - TimeDelta::minutes(1), start, end - TimeDelta::minutes(1), end] {
        repository
            .record_progress(task.id(), ProgressEntry::new("tick"), instant)
            .await?;
    }

    let inside = repository.worklogs_between(start, end).await?;

    let instants: Vec<DateTime<Utc>> = inside.iter().map(|log| log.created_at()).collect();
    ensure!(
        instants == [start, end - TimeDelta::minutes(1)],
        "window returned {instants:?}"
    );
    Ok(())
}

pub async fn listings_follow_status_and_order(
    repository: &impl TaskRepository,
) -> eyre::Result<()> {
    let older = stored(repository, "Older", 8).await?;
    let newer = stored(repository, "Newer", 9).await?;
    let early_done = stored(repository, "Early done", 7).await?;
    let late_done = stored(repository, "Late done", 6).await?;
    repository
        .record_progress(
            newer.id(),
            ProgressEntry::new("started").with_status(TaskStatus::InProgress),
            local_instant(work_day(), 10, 0),
        )
        .await?;
    repository
        .record_progress(
            early_done.id(),
            ProgressEntry::new("done").marking_done(true),
            local_instant(work_day(), 11, 0),
        )
        .await?;
    repository
        .record_progress(
            late_done.id(),
            ProgressEntry::new("done").marking_done(true),
            local_instant(work_day(), 14, 0),
        )
        .await?;

    let active: Vec<TaskId> = repository
        .list_active()
        .await?
        .iter()
        .map(|summary| summary.id)
        .collect();
    ensure!(active == [newer.id(), older.id()], "active was {active:?}");

    let history: Vec<TaskId> = repository
        .list_completed(10)
        .await?
        .iter()
        .map(|summary| summary.id)
        .collect();
    ensure!(history == [late_done.id(), early_done.id()], "history was {history:?}");

    let capped = repository.list_completed(1).await?;
    ensure!(capped.len() == 1, "limit applies");

    let window: Vec<TaskId> = repository
        .list_completed_between(
            local_instant(work_day(), 10, 30),
            local_instant(work_day(), 14, 0),
        )
        .await?
        .iter()
        .map(Task::id)
        .collect();
    ensure!(window == [early_done.id()], "completion window was {window:?}");

    let everything = repository.list_all().await?;
    ensure!(everything.len() == 4, "list_all returned {}", everything.len());
    Ok(())
}

pub async fn equal_timestamps_list_in_id_order(
    repository: &impl TaskRepository,
) -> eyre::Result<()> {
    let mut open = Vec::new();
    for title in ["One", "Two", "Three", "Four"] {
        open.push(stored(repository, title, 8).await?.id());
    }
    let mut finished = Vec::new();
    for title in ["Five", "Six", "Seven"] {
        let task = stored(repository, title, 8).await?;
        repository
            .record_progress(
                task.id(),
                ProgressEntry::new("done").marking_done(true),
                local_instant(work_day(), 12, 0),
            )
            .await?;
        finished.push(task.id());
    }
    open.sort();
    finished.sort();

    let active: Vec<TaskId> = repository
        .list_active()
        .await?
        .iter()
        .map(|summary| summary.id)
        .collect();
    let history: Vec<TaskId> = repository
        .list_completed(10)
        .await?
        .iter()
        .map(|summary| summary.id)
        .collect();
    let everything: Vec<TaskId> = repository.list_all().await?.iter().map(Task::id).collect();

    ensure!(active == open, "active was {active:?}");
    ensure!(history == finished, "history was {history:?}");
    let mut expected_all = [open, finished].concat();
    expected_all.sort();
    ensure!(everything == expected_all, "all tasks were {everything:?}");
    Ok(())
}

pub async fn rejected_progress_writes_nothing(
    repository: &impl TaskRepository,
) -> eyre::Result<()> {
    let task = stored(repository, "Guarded", 8).await?;
    let done_at = local_instant(work_day(), 9, 0);
    repository
        .record_progress(task.id(), ProgressEntry::new("done").marking_done(true), done_at)
        .await?;

    let again = repository
        .record_progress(
            task.id(),
            ProgressEntry::new("too late"),
            local_instant(work_day(), 10, 0),
        )
        .await;
    let update = repository
        .update_details(
            task.id(),
            TaskChanges {
                description: Some("edited".to_owned()),
                ..TaskChanges::default()
            },
            local_instant(work_day(), 10, 0),
        )
        .await;

    ensure!(
        matches!(
            again,
            Err(TaskRepositoryError::Domain(TaskDomainError::TaskAlreadyDone(_)))
        ),
        "progress on done task: {again:?}"
    );
    ensure!(
        matches!(
            update,
            Err(TaskRepositoryError::Domain(TaskDomainError::TaskAlreadyDone(_)))
        ),
        "update on done task: {update:?}"
    );
    let Some(detail) = repository.find_with_worklogs(task.id()).await? else {
        bail!("task should exist");
    };
    ensure!(detail.logs.len() == 1, "only the completing log is stored");
    ensure!(detail.task.updated_at() == done_at, "task untouched");
    ensure!(
        detail.task.description() == Some("stored verbatim"),
        "description untouched"
    );
    Ok(())
}

pub async fn blank_log_text_writes_nothing(repository: &impl TaskRepository) -> eyre::Result<()> {
    let task = stored(repository, "Blank", 8).await?;

    let result = repository
        .record_progress(
            task.id(),
            ProgressEntry::new("  ").marking_done(true),
            local_instant(work_day(), 9, 0),
        )
        .await;

    ensure!(
        matches!(
            result,
            Err(TaskRepositoryError::Domain(TaskDomainError::EmptyLogText))
        ),
        "blank text: {result:?}"
    );
    let found = repository.find_by_id(task.id()).await?;
    ensure!(found.as_ref() == Some(&task), "task untouched");
    ensure!(repository.worklogs_for(task.id()).await?.is_empty(), "no worklog");
    Ok(())
}

pub async fn update_details_persists_changes(
    repository: &impl TaskRepository,
) -> eyre::Result<()> {
    let task = stored(repository, "Editable", 8).await?;
    let now = local_instant(work_day(), 12, 0);

    let updated = repository
        .update_details(
            task.id(),
            TaskChanges {
                category: Some("edited".to_owned()),
                description: Some(String::new()),
                ..TaskChanges::default()
            },
            now,
        )
        .await?;

    let found = repository.find_by_id(task.id()).await?;
    ensure!(found.as_ref() == Some(&updated), "stored copy matches");
    ensure!(updated.category() == "edited", "category replaced");
    ensure!(updated.description().is_none(), "blank description clears it");
    ensure!(updated.links() == task.links(), "links kept");
    ensure!(updated.updated_at() == now, "updated_at advanced");
    Ok(())
}

pub async fn unknown_ids_are_not_found(repository: &impl TaskRepository) -> eyre::Result<()> {
    let missing = TaskId::new();
    let now = local_instant(work_day(), 9, 0);

    let progress = repository
        .record_progress(missing, ProgressEntry::new("text"), now)
        .await;
    let update = repository
        .update_details(missing, TaskChanges::default(), now)
        .await;
    let delete = repository.delete_task(missing).await;
    let delete_log = repository.delete_worklog(WorklogId::new()).await;
    let detail = repository.find_with_worklogs(missing).await?;

    ensure!(
        matches!(progress, Err(TaskRepositoryError::NotFound(id)) if id == missing),
        "progress: {progress:?}"
    );
    ensure!(
        matches!(update, Err(TaskRepositoryError::NotFound(_))),
        "update: {update:?}"
    );
    ensure!(
        matches!(delete, Err(TaskRepositoryError::NotFound(_))),
        "delete: {delete:?}"
    );
    ensure!(
        matches!(delete_log, Err(TaskRepositoryError::WorklogNotFound(_))),
        "delete worklog: {delete_log:?}"
    );
    ensure!(detail.is_none(), "detail of unknown task");
    Ok(())
}

pub async fn deleting_a_task_cascades(repository: &impl TaskRepository) -> eyre::Result<()> {
    let doomed = stored(repository, "Doomed", 8).await?;
    let kept = stored(repository, "Kept", 9).await?;
    let now = local_instant(work_day(), 10, 0);
    let doomed_log = repository
        .record_progress(doomed.id(), ProgressEntry::new("gone soon"), now)
        .await?
        .worklog;
    repository
        .record_progress(kept.id(), ProgressEntry::new("stays"), now)
        .await?;

    repository.delete_task(doomed.id()).await?;

    ensure!(repository.find_by_id(doomed.id()).await?.is_none(), "task removed");
    let remaining = repository
        .worklogs_between(now - TimeDelta::hours(1), now + TimeDelta::hours(1))
        .await?;
    ensure!(
        remaining.iter().all(|log| log.task_id() == kept.id()) && remaining.len() == 1,
        "remaining worklogs {remaining:?}"
    );
    let again = repository.delete_worklog(doomed_log.id()).await;
    ensure!(
        matches!(again, Err(TaskRepositoryError::WorklogNotFound(_))),
        "cascaded worklog should be gone: {again:?}"
    );
    Ok(())
}

pub async fn deleting_a_worklog_leaves_siblings(
    repository: &impl TaskRepository,
) -> eyre::Result<()> {
    let task = stored(repository, "Pruned", 8).await?;
    let first = repository
        .record_progress(task.id(), ProgressEntry::new("keep"), local_instant(work_day(), 9, 0))
        .await?
        .worklog;
    let second = repository
        .record_progress(task.id(), ProgressEntry::new("drop"), local_instant(work_day(), 10, 0))
        .await?
        .worklog;

    repository.delete_worklog(second.id()).await?;

    let logs = repository.worklogs_for(task.id()).await?;
    ensure!(logs == [first], "remaining logs {logs:?}");
    Ok(())
}
