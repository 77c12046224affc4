//! `SQLite` repository implementation for task and worklog storage.

use super::{
    models::{TaskRow, WorklogRow},
    schema::{CREATE_SCHEMA_SQL, tasks, worklogs},
};
use crate::task::{
    domain::{
        PersistedTaskData, PersistedWorklogData, ProgressEntry, ProgressOutcome, Task,
        TaskChanges, TaskDetail, TaskId, TaskStatus, TaskSummary, Worklog, WorklogId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use chrono::{DateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sqlite::SqliteConnection;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// `SQLite` connection pool type used by task adapters.
pub type TaskSqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Connection settings for a single-file store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    /// Database file path; the parent directory is created on open.
    pub path: Utf8PathBuf,
    /// Maximum pooled connections.
    pub pool_size: u32,
    /// How long a connection waits on a locked database.
    pub busy_timeout: Duration,
}

impl SqliteOptions {
    /// Creates options with a pool of four and a five second busy timeout.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool_size: 4,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Applies per-connection pragmas as connections enter the pool.
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas {
    busy_timeout: Duration,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let pragmas = format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        );
        connection
            .batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// `SQLite`-backed task repository.
#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    pool: TaskSqlitePool,
}

impl SqliteTaskRepository {
    /// Creates a new repository from an existing connection pool.
    ///
    /// The schema is assumed to exist; see [`Self::open`].
    #[must_use]
    pub const fn new(pool: TaskSqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database file and ensures the schema.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the directory, pool,
    /// or schema cannot be set up.
    pub async fn open(options: SqliteOptions) -> TaskRepositoryResult<Self> {
        tokio::task::spawn_blocking(move || Self::open_blocking(&options))
            .await
            .map_err(TaskRepositoryError::persistence)?
    }

    fn open_blocking(options: &SqliteOptions) -> TaskRepositoryResult<Self> {
        if let Some(parent) = options.path.parent().filter(|dir| !dir.as_str().is_empty()) {
            Dir::create_ambient_dir_all(parent, ambient_authority())
                .map_err(TaskRepositoryError::persistence)?;
        }

        let manager = ConnectionManager::<SqliteConnection>::new(options.path.as_str());
        let pool = Pool::builder()
            .max_size(options.pool_size.max(1))
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout: options.busy_timeout,
            }))
            .build(manager)
            .map_err(TaskRepositoryError::persistence)?;

        let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
        connection.batch_execute("PRAGMA journal_mode = WAL;")?;
        connection.batch_execute(CREATE_SCHEMA_SQL)?;
        debug!(path = %options.path, "sqlite store ready");

        Ok(Self::new(pool))
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let row = to_task_row(task);

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            find_task_row(connection, id)?.map(row_to_task).transpose()
        })
        .await
    }

    async fn find_with_worklogs(&self, id: TaskId) -> TaskRepositoryResult<Option<TaskDetail>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let Some(row) = find_task_row(tx, id)? else {
                    return Ok(None);
                };
                let task = row_to_task(row)?;
                let logs = load_worklogs_for(tx, id)?;
                Ok(Some(TaskDetail { task, logs }))
            })
        })
        .await
    }

    async fn list_active(&self) -> TaskRepositoryResult<Vec<TaskSummary>> {
        self.run_blocking(|connection| {
            let rows = tasks::table
                .filter(tasks::status.eq_any([
                    TaskStatus::Todo.as_str(),
                    TaskStatus::InProgress.as_str(),
                ]))
                .order((tasks::created_at.desc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter()
                .map(|row| row_to_task(row).map(|task| task.summary()))
                .collect()
        })
        .await
    }

    async fn list_completed(&self, limit: usize) -> TaskRepositoryResult<Vec<TaskSummary>> {
        let max_rows = i64::try_from(limit).unwrap_or(i64::MAX);
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(TaskStatus::Done.as_str()))
                .order((tasks::actual_completed_at.desc(), tasks::id.asc()))
                .limit(max_rows)
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter()
                .map(|row| row_to_task(row).map(|task| task.summary()))
                .collect()
        })
        .await
    }

    async fn list_completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(TaskStatus::Done.as_str()))
                .filter(tasks::actual_completed_at.ge(start.naive_utc()))
                .filter(tasks::actual_completed_at.lt(end.naive_utc()))
                .order((tasks::actual_completed_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_all(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(|connection| {
            let rows = tasks::table
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn worklogs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Worklog>> {
        self.run_blocking(move |connection| {
            let rows = worklogs::table
                .filter(worklogs::created_at.ge(start.naive_utc()))
                .filter(worklogs::created_at.lt(end.naive_utc()))
                .order(worklogs::created_at.asc())
                .select(WorklogRow::as_select())
                .load::<WorklogRow>(connection)?;
            rows.into_iter().map(row_to_worklog).collect()
        })
        .await
    }

    async fn worklogs_for(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Worklog>> {
        self.run_blocking(move |connection| load_worklogs_for(connection, task_id))
            .await
    }

    async fn record_progress(
        &self,
        id: TaskId,
        entry: ProgressEntry,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<ProgressOutcome> {
        self.run_blocking(move |connection| {
            connection.immediate_transaction::<_, TaskRepositoryError, _>(|tx| {
                let row = find_task_row(tx, id)?.ok_or(TaskRepositoryError::NotFound(id))?;
                let mut task = row_to_task(row)?;
                let worklog = task.record_progress(entry, now)?;

                diesel::insert_into(worklogs::table)
                    .values(&to_worklog_row(&worklog))
                    .execute(tx)?;
                diesel::update(tasks::table.find(id.to_string()))
                    .set(&to_task_row(&task))
                    .execute(tx)?;

                Ok(ProgressOutcome { task, worklog })
            })
        })
        .await
    }

    async fn update_details(
        &self,
        id: TaskId,
        changes: TaskChanges,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        self.run_blocking(move |connection| {
            connection.immediate_transaction::<_, TaskRepositoryError, _>(|tx| {
                let row = find_task_row(tx, id)?.ok_or(TaskRepositoryError::NotFound(id))?;
                let mut task = row_to_task(row)?;
                task.apply_changes(changes, now)?;

                diesel::update(tasks::table.find(id.to_string()))
                    .set(&to_task_row(&task))
                    .execute(tx)?;
                Ok(task)
            })
        })
        .await
    }

    async fn delete_task(&self, id: TaskId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.immediate_transaction::<_, TaskRepositoryError, _>(|tx| {
                let key = id.to_string();
                diesel::delete(worklogs::table.filter(worklogs::task_id.eq(&key))).execute(tx)?;
                let removed = diesel::delete(tasks::table.find(&key)).execute(tx)?;
                if removed == 0 {
                    return Err(TaskRepositoryError::NotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn delete_worklog(&self, id: WorklogId) -> TaskRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(worklogs::table.find(id.to_string())).execute(connection)?;
            if removed == 0 {
                return Err(TaskRepositoryError::WorklogNotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn find_task_row(
    connection: &mut SqliteConnection,
    id: TaskId,
) -> TaskRepositoryResult<Option<TaskRow>> {
    Ok(tasks::table
        .find(id.to_string())
        .select(TaskRow::as_select())
        .first::<TaskRow>(connection)
        .optional()?)
}

fn load_worklogs_for(
    connection: &mut SqliteConnection,
    task_id: TaskId,
) -> TaskRepositoryResult<Vec<Worklog>> {
    let rows = worklogs::table
        .filter(worklogs::task_id.eq(task_id.to_string()))
        .order(worklogs::created_at.asc())
        .select(WorklogRow::as_select())
        .load::<WorklogRow>(connection)?;
    rows.into_iter().map(row_to_worklog).collect()
}

fn to_task_row(task: &Task) -> TaskRow {
    TaskRow {
        id: task.id().to_string(),
        title: task.title().to_owned(),
        category: task.category().to_owned(),
        description: task.description().map(str::to_owned),
        targets: task.targets().map(str::to_owned),
        links: task.links().map(str::to_owned),
        status: task.status().as_str().to_owned(),
        deadline: task.deadline().map(|at| at.naive_utc()),
        actual_completed_at: task.actual_completed_at().map(|at| at.naive_utc()),
        created_at: task.created_at().naive_utc(),
        updated_at: task.updated_at().naive_utc(),
    }
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title,
        category,
        description,
        targets,
        links,
        status,
        deadline,
        actual_completed_at,
        created_at,
        updated_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::from_str(&id).map_err(TaskRepositoryError::persistence)?,
        title,
        category,
        description,
        targets,
        links,
        status: TaskStatus::try_from(status.as_str()).map_err(TaskRepositoryError::persistence)?,
        deadline: deadline.map(|at| at.and_utc()),
        actual_completed_at: actual_completed_at.map(|at| at.and_utc()),
        created_at: created_at.and_utc(),
        updated_at: updated_at.and_utc(),
    };
    Ok(Task::from_persisted(data))
}

fn to_worklog_row(worklog: &Worklog) -> WorklogRow {
    WorklogRow {
        id: worklog.id().to_string(),
        task_id: worklog.task_id().to_string(),
        log_text: worklog.log_text().to_owned(),
        progress_note: worklog.progress_note().map(str::to_owned),
        created_at: worklog.created_at().naive_utc(),
    }
}

fn row_to_worklog(row: WorklogRow) -> TaskRepositoryResult<Worklog> {
    Ok(Worklog::from_persisted(PersistedWorklogData {
        id: WorklogId::from_str(&row.id).map_err(TaskRepositoryError::persistence)?,
        task_id: TaskId::from_str(&row.task_id).map_err(TaskRepositoryError::persistence)?,
        log_text: row.log_text,
        progress_note: row.progress_note,
        created_at: row.created_at.and_utc(),
    }))
}
