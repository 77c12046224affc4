//! Repository contract checks against the `SQLite` adapter.

use super::helpers::open_temp_store;
use crate::repository_contract as contract;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_task_round_trips() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::stored_task_round_trips(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_task_is_rejected() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::duplicate_task_is_rejected(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn worklogs_come_back_in_time_order() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::worklogs_come_back_in_time_order(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn worklog_window_is_half_open() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::worklog_window_is_half_open(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listings_follow_status_and_order() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::listings_follow_status_and_order(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn equal_timestamps_list_in_id_order() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::equal_timestamps_list_in_id_order(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejected_progress_writes_nothing() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::rejected_progress_writes_nothing(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_log_text_writes_nothing() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::blank_log_text_writes_nothing(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_details_persists_changes() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::update_details_persists_changes(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_ids_are_not_found() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::unknown_ids_are_not_found(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_cascades() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::deleting_a_task_cascades(&store.repository).await
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_worklog_leaves_siblings() -> eyre::Result<()> {
    let store = open_temp_store().await?;
    contract::deleting_a_worklog_leaves_siblings(&store.repository).await
}
