//! Command-line interface.
//!
//! [`Cli`] is the clap parser for the `chronicle` binary. [`execute`] opens
//! the configured store and runs one command; [`run_command`] does the same
//! against services the caller has already wired.

mod error;
pub mod render;

pub use error::CliError;

use crate::api::{ApiRouter, ApiServer};
use crate::config::ChronicleConfig;
use crate::task::{
    adapters::sqlite::SqliteTaskRepository,
    domain::{TaskDomainError, TaskId, WorklogId},
    ports::TaskRepository,
    services::{
        CreateTaskRequest, ProgressUpdateRequest, TaskLifecycleError, TaskLifecycleService,
        TaskListFilter, TaskReportService, UpdateTaskRequest,
    },
};
use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::{Parser, Subcommand, ValueEnum};
use mockable::{Clock, DefaultClock};
use serde::Serialize;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Output rendering for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// The JSON payload the HTTP API returns in `data`.
    Json,
}

/// Top-level parser for the `chronicle` binary.
#[derive(Debug, Parser)]
#[command(name = "chronicle", version, about = "Personal task tracker")]
pub struct Cli {
    /// Command to run.
    #[command(subcommand)]
    pub command: Command,

    /// Database file, overriding `database.path`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Applies flag overrides on top of loaded configuration.
    #[must_use]
    pub fn apply_overrides(&self, mut config: ChronicleConfig) -> ChronicleConfig {
        if let Some(db) = &self.db {
            config.database.path.clone_from(db);
        }
        if let Command::Serve { addr: Some(addr) } = &self.command {
            config.server.addr.clone_from(addr);
        }
        config
    }
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a task.
    Create {
        /// Short title.
        title: String,
        /// Grouping label.
        #[arg(short, long)]
        category: String,
        /// Free-text description.
        #[arg(short, long)]
        description: Option<String>,
        /// Free-text targets.
        #[arg(short, long)]
        targets: Option<String>,
        /// Reference link; repeat for several.
        #[arg(short, long = "link")]
        links: Vec<String>,
        /// Deadline as RFC 3339 with offset.
        #[arg(long)]
        deadline: Option<String>,
    },
    /// List active tasks, one status of them, or completed ones with `done`.
    List {
        /// `todo`, `in-progress`, `todo,in-progress` (default) or `done`.
        #[arg(default_value = "")]
        status: String,
    },
    /// Show a task and its worklogs.
    Get {
        /// Task identifier.
        id: String,
    },
    /// Change fields of an open task.
    Update {
        /// Task identifier.
        id: String,
        /// Replacement category.
        #[arg(short, long)]
        category: Option<String>,
        /// Replacement description.
        #[arg(short, long)]
        description: Option<String>,
        /// Replacement targets.
        #[arg(short, long)]
        targets: Option<String>,
        /// Replacement links; repeat for several.
        #[arg(short, long = "link")]
        links: Vec<String>,
        /// Replacement deadline.
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Delete a task and its worklogs.
    Delete {
        /// Task identifier.
        id: String,
    },
    /// Log progress against a task.
    Log {
        /// Task identifier.
        id: String,
        /// What was done.
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        /// Mark the task done.
        #[arg(long)]
        done: bool,
        /// Move to `todo`, `in-progress`, or `done`.
        #[arg(short, long)]
        status: Option<String>,
        /// Short annotation.
        #[arg(short, long)]
        note: Option<String>,
        /// New deadline.
        #[arg(long)]
        deadline: Option<String>,
    },
    /// Delete a single worklog.
    DeleteLog {
        /// Worklog identifier.
        id: String,
    },
    /// Summarise a day's worklogs by task.
    Summary {
        /// `YYYY-MM-DD`, today when omitted.
        date: Option<String>,
    },
    /// Show aggregate statistics.
    Stats,
    /// Export a day's completed tasks as Markdown.
    Export {
        /// `YYYY-MM-DD`, today when omitted.
        date: Option<String>,
        /// Write to this file instead of standard output.
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },
    /// Serve the HTTP JSON API.
    Serve {
        /// Listen address, overriding `server.addr`.
        #[arg(long)]
        addr: Option<String>,
    },
}

/// Opens the configured store and runs the parsed command.
///
/// # Errors
///
/// Returns [`CliError`] when the store cannot be opened or the command
/// fails.
pub async fn execute(
    cli: Cli,
    config: ChronicleConfig,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let config = cli.apply_overrides(config);
    let repository = Arc::new(SqliteTaskRepository::open(config.sqlite_options()).await?);
    let clock = Arc::new(DefaultClock);
    let lifecycle = TaskLifecycleService::new(Arc::clone(&repository), Arc::clone(&clock))
        .with_history_limit(config.report.history_limit);
    let reports =
        TaskReportService::new(repository, clock).with_stats_days(config.report.stats_days);

    let context = CommandContext {
        lifecycle: &lifecycle,
        reports: &reports,
        format: cli.format,
        server_addr: &config.server.addr,
    };
    run_command(cli.command, &context, out).await
}

/// Services and settings a command runs against.
pub struct CommandContext<'a, R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    /// Task operations.
    pub lifecycle: &'a TaskLifecycleService<R, C>,
    /// Reports and exports.
    pub reports: &'a TaskReportService<R, C>,
    /// Output rendering.
    pub format: OutputFormat,
    /// Listen address for `serve`.
    pub server_addr: &'a str,
}

/// Runs one command, writing its result to `out`.
///
/// # Errors
///
/// Returns [`CliError`] when the command fails or output cannot be written.
pub async fn run_command<R, C>(
    command: Command,
    context: &CommandContext<'_, R, C>,
    out: &mut impl Write,
) -> Result<(), CliError>
where
    R: TaskRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    let CommandContext {
        lifecycle,
        reports,
        format,
        server_addr,
    } = *context;

    match command {
        Command::Create {
            title,
            category,
            description,
            targets,
            links,
            deadline,
        } => {
            let mut request = CreateTaskRequest::new(title, category);
            if let Some(description) = description {
                request = request.with_description(description);
            }
            if let Some(targets) = targets {
                request = request.with_targets(targets);
            }
            if !links.is_empty() {
                request = request.with_links(links.join("\n"));
            }
            if let Some(deadline) = deadline {
                request = request.with_deadline(deadline);
            }
            let task = lifecycle.create(request).await?;
            emit(out, format, &task, |w, value| render::task(w, value))
        }
        Command::List { status } => {
            let filter = TaskListFilter::parse_status(&status).map_err(TaskLifecycleError::from)?;
            let tasks = lifecycle.list(filter).await?;
            emit(out, format, &tasks, |w, value| render::task_list(w, value))
        }
        Command::Get { id } => {
            let detail = lifecycle.get(parse_id(&id)?).await?;
            emit(out, format, &detail, |w, value| render::task_detail(w, value))
        }
        Command::Update {
            id,
            category,
            description,
            targets,
            links,
            deadline,
        } => {
            let mut request = UpdateTaskRequest::new();
            if let Some(category) = category {
                request = request.with_category(category);
            }
            if let Some(description) = description {
                request = request.with_description(description);
            }
            if let Some(targets) = targets {
                request = request.with_targets(targets);
            }
            if !links.is_empty() {
                request = request.with_links(links.join("\n"));
            }
            if let Some(deadline) = deadline {
                request = request.with_deadline(deadline);
            }
            let task = lifecycle.update(parse_id(&id)?, request).await?;
            emit(out, format, &task, |w, value| render::task(w, value))
        }
        Command::Delete { id } => {
            let task_id: TaskId = parse_id(&id)?;
            lifecycle.delete_task(task_id).await?;
            emit(out, format, &(), |w, _| writeln!(w, "deleted task {task_id}"))
        }
        Command::Log {
            id,
            message,
            done,
            status,
            note,
            deadline,
        } => {
            let mut request = ProgressUpdateRequest::new(message.join(" ")).mark_as_done(done);
            if let Some(status) = status {
                request = request.with_status(status);
            }
            if let Some(note) = note {
                request = request.with_note(note);
            }
            if let Some(deadline) = deadline {
                request = request.with_deadline(deadline);
            }
            let outcome = lifecycle.update_progress(parse_id(&id)?, request).await?;
            emit(out, format, &outcome, |w, value| render::progress(w, value))
        }
        Command::DeleteLog { id } => {
            let worklog_id: WorklogId = parse_id(&id)?;
            lifecycle.delete_worklog(worklog_id).await?;
            emit(out, format, &(), |w, _| {
                writeln!(w, "deleted worklog {worklog_id}")
            })
        }
        Command::Summary { date } => {
            let summary = reports.daily_summary(date.as_deref()).await?;
            emit(out, format, &summary, |w, value| {
                render::daily_summary(w, value)
            })
        }
        Command::Stats => {
            let stats = reports.stats().await?;
            emit(out, format, &stats, |w, value| render::stats(w, value))
        }
        Command::Export { date, output } => {
            let document = reports.export_daily_markdown(date.as_deref()).await?;
            match output {
                Some(path) => {
                    write_file(&path, &document)?;
                    info!(%path, "markdown export written");
                    Ok(())
                }
                None => Ok(out.write_all(document.as_bytes())?),
            }
        }
        Command::Serve { .. } => {
            let router = ApiRouter::new(lifecycle.clone(), reports.clone());
            let server = ApiServer::bind(server_addr, router)?;
            if let Some(addr) = server.local_addr() {
                writeln!(out, "listening on http://{addr}")?;
                out.flush()?;
            }
            Ok(server.run().await?)
        }
    }
}

fn parse_id<T>(raw: &str) -> Result<T, CliError>
where
    T: FromStr<Err = TaskDomainError>,
{
    T::from_str(raw).map_err(|err| CliError::Service(err.into()))
}

fn emit<T, W, F>(out: &mut W, format: OutputFormat, value: &T, text: F) -> Result<(), CliError>
where
    T: Serialize,
    W: Write,
    F: FnOnce(&mut W, &T) -> io::Result<()>,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Text => text(out, value)?,
    }
    Ok(())
}

fn write_file(path: &Utf8PathBuf, contents: &str) -> Result<(), CliError> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_str().is_empty())
        .map_or_else(|| ".".into(), ToOwned::to_owned);
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("export path has no file name: {path}"),
        )
    })?;
    let dir = Dir::open_ambient_dir(&parent, ambient_authority())?;
    dir.write(file_name, contents)?;
    Ok(())
}
