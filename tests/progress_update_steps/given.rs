//! Given steps for progress update BDD scenarios.

use super::world::{ProgressWorld, run_async};
use chronicle::task::services::{CreateTaskRequest, ProgressUpdateRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"a task "{title}" in category "{category}""#)]
fn task_exists(
    world: &mut ProgressWorld,
    title: String,
    category: String,
) -> Result<(), eyre::Report> {
    let created = run_async(
        world
            .services
            .lifecycle
            .create(CreateTaskRequest::new(title, category)),
    )
    .wrap_err("create task for progress scenario")?;
    world.task = Some(created);
    Ok(())
}

#[given(r#"at "{time}" progress "{text}" was logged and the task marked done"#)]
fn task_was_completed(
    world: &mut ProgressWorld,
    time: String,
    text: String,
) -> Result<(), eyre::Report> {
    world.log_at(&time, ProgressUpdateRequest::new(text).mark_as_done(true))?;
    match world.last_update.take() {
        Some(Ok(_)) => Ok(()),
        other => Err(eyre::eyre!("completing the task in setup failed: {other:?}")),
    }
}
