//! Repository contract checks against the in-memory adapter.

use crate::repository_contract as contract;
use chronicle::task::adapters::memory::InMemoryTaskRepository;
use rstest::{fixture, rstest};

#[fixture]
fn repository() -> InMemoryTaskRepository {
    InMemoryTaskRepository::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_task_round_trips(repository: InMemoryTaskRepository) -> eyre::Result<()> {
    contract::stored_task_round_trips(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_task_is_rejected(repository: InMemoryTaskRepository) -> eyre::Result<()> {
    contract::duplicate_task_is_rejected(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn worklogs_come_back_in_time_order(
    repository: InMemoryTaskRepository,
) -> eyre::Result<()> {
    contract::worklogs_come_back_in_time_order(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn worklog_window_is_half_open(repository: InMemoryTaskRepository) -> eyre::Result<()> {
    contract::worklog_window_is_half_open(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listings_follow_status_and_order(
    repository: InMemoryTaskRepository,
) -> eyre::Result<()> {
    contract::listings_follow_status_and_order(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn equal_timestamps_list_in_id_order(
    repository: InMemoryTaskRepository,
) -> eyre::Result<()> {
    contract::equal_timestamps_list_in_id_order(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_progress_writes_nothing(
    repository: InMemoryTaskRepository,
) -> eyre::Result<()> {
    contract::rejected_progress_writes_nothing(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_log_text_writes_nothing(repository: InMemoryTaskRepository) -> eyre::Result<()> {
    contract::blank_log_text_writes_nothing(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_details_persists_changes(
    repository: InMemoryTaskRepository,
) -> eyre::Result<()> {
    contract::update_details_persists_changes(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_ids_are_not_found(repository: InMemoryTaskRepository) -> eyre::Result<()> {
    contract::unknown_ids_are_not_found(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_cascades(repository: InMemoryTaskRepository) -> eyre::Result<()> {
    contract::deleting_a_task_cascades(&repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_worklog_leaves_siblings(
    repository: InMemoryTaskRepository,
) -> eyre::Result<()> {
    contract::deleting_a_worklog_leaves_siblings(&repository).await
}
