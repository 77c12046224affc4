//! When steps for progress update BDD scenarios.

use super::world::ProgressWorld;
use chronicle::task::services::ProgressUpdateRequest;
use rstest_bdd_macros::when;

#[when(r#"at "{time}" progress "{text}" is logged"#)]
fn log_progress(world: &mut ProgressWorld, time: String, text: String) -> Result<(), eyre::Report> {
    world.log_at(&time, ProgressUpdateRequest::new(text))
}

#[when(r#"at "{time}" progress "{text}" is logged with status "{status}""#)]
fn log_progress_with_status(
    world: &mut ProgressWorld,
    time: String,
    text: String,
    status: String,
) -> Result<(), eyre::Report> {
    world.log_at(&time, ProgressUpdateRequest::new(text).with_status(status))
}

#[when(r#"at "{time}" progress "{text}" is logged and the task marked done"#)]
fn log_progress_marking_done(
    world: &mut ProgressWorld,
    time: String,
    text: String,
) -> Result<(), eyre::Report> {
    world.log_at(&time, ProgressUpdateRequest::new(text).mark_as_done(true))
}
