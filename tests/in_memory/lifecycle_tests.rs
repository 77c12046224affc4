//! In-memory integration tests for task lifecycle and reporting flows.

use crate::test_helpers::{Services, local_instant, work_day};
use chronicle::task::{
    adapters::memory::InMemoryTaskRepository,
    domain::TaskStatus,
    services::{CreateTaskRequest, ErrorKind, ProgressUpdateRequest, TaskLifecycleError},
};
use eyre::{bail, ensure};
use rstest::{fixture, rstest};
use std::sync::Arc;

type TestServices = Services<InMemoryTaskRepository>;

#[fixture]
fn services() -> TestServices {
    Services::new(Arc::new(InMemoryTaskRepository::new()))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn daily_summary_groups_by_first_activity(services: TestServices) -> eyre::Result<()> {
    let review = services
        .lifecycle
        .create(CreateTaskRequest::new("Review PR", "dev"))
        .await?;
    let docs = services
        .lifecycle
        .create(CreateTaskRequest::new("Write docs", "writing"))
        .await?;

    services.at(9, 15);
    services
        .lifecycle
        .update_progress(docs.id(), ProgressUpdateRequest::new("Outline drafted"))
        .await?;
    services.at(11, 0);
    services
        .lifecycle
        .update_progress(
            review.id(),
            ProgressUpdateRequest::new("Left comments").with_status("in-progress"),
        )
        .await?;
    services.at(14, 45);
    services
        .lifecycle
        .update_progress(docs.id(), ProgressUpdateRequest::new("Examples added"))
        .await?;

    let summary = services.reports.daily_summary(Some("2024-05-06")).await?;

    let titles: Vec<&str> = summary
        .activities
        .iter()
        .map(|activity| activity.task_title.as_str())
        .collect();
    ensure!(titles == ["Write docs", "Review PR"], "order was {titles:?}");
    let [docs_activity, review_activity] = summary.activities.as_slice() else {
        bail!("expected two activities");
    };
    ensure!(
        docs_activity.today_logs == ["09:15 - Outline drafted", "14:45 - Examples added"],
        "docs logs {:?}",
        docs_activity.today_logs
    );
    ensure!(
        review_activity.status == TaskStatus::InProgress,
        "review status {}",
        review_activity.status
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_task_conflicts_on_every_mutation(services: TestServices) -> eyre::Result<()> {
    let task = services
        .lifecycle
        .create(CreateTaskRequest::new("T2", "dev"))
        .await?;
    services
        .lifecycle
        .update_progress(task.id(), ProgressUpdateRequest::new("Done").mark_as_done(true))
        .await?;

    let result = services
        .lifecycle
        .update_progress(
            task.id(),
            ProgressUpdateRequest::new("Reopen").with_status("todo"),
        )
        .await;

    let Err(err) = result else {
        bail!("progress on a done task should fail");
    };
    ensure!(err.kind() == ErrorKind::Conflict, "kind was {:?}", err.kind());
    ensure!(
        matches!(err, TaskLifecycleError::Repository(_)),
        "conflict surfaces from the repository: {err:?}"
    );
    let detail = services.lifecycle.get(task.id()).await?;
    ensure!(detail.task.status() == TaskStatus::Done, "status stays done");
    ensure!(detail.logs.len() == 1, "no extra worklog");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_progress_updates_are_all_recorded(
    services: TestServices,
) -> eyre::Result<()> {
    let task = services
        .lifecycle
        .create(CreateTaskRequest::new("Busy task", "dev"))
        .await?;

    let mut handles = Vec::new();
    for index in 0..8 {
        let lifecycle = services.lifecycle.clone();
        let id = task.id();
        handles.push(tokio::spawn(async move {
            lifecycle
                .update_progress(id, ProgressUpdateRequest::new(format!("step {index}")))
                .await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let detail = services.lifecycle.get(task.id()).await?;
    ensure!(detail.logs.len() == 8, "recorded {} logs", detail.logs.len());
    ensure!(
        detail.task.updated_at() == local_instant(work_day(), 9, 0),
        "clock did not move"
    );
    Ok(())
}
