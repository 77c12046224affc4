//! In-memory task repository for tests and ephemeral runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        ProgressEntry, ProgressOutcome, Task, TaskChanges, TaskDetail, TaskId, TaskSummary,
        Worklog, WorklogId,
    },
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory task repository.
///
/// Every mutation runs under a single write guard, which makes multi-step
/// operations atomic with respect to concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    worklogs: Vec<Worklog>,
}

impl InMemoryTaskState {
    fn logs_of(&self, task_id: TaskId) -> Vec<Worklog> {
        let mut logs: Vec<Worklog> = self
            .worklogs
            .iter()
            .filter(|log| log.task_id() == task_id)
            .cloned()
            .collect();
        logs.sort_by_key(Worklog::created_at);
        logs
    }
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskRepositoryResult<RwLockReadGuard<'_, InMemoryTaskState>> {
        self.state.read().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskRepositoryResult<RwLockWriteGuard<'_, InMemoryTaskState>> {
        self.state.write().map_err(|err| {
            TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_with_worklogs(&self, id: TaskId) -> TaskRepositoryResult<Option<TaskDetail>> {
        let state = self.read()?;
        Ok(state.tasks.get(&id).map(|task| TaskDetail {
            task: task.clone(),
            logs: state.logs_of(id),
        }))
    }

    async fn list_active(&self) -> TaskRepositoryResult<Vec<TaskSummary>> {
        let state = self.read()?;
        let mut active: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| task.status().is_active())
            .collect();
        active.sort_by_key(|task| (Reverse(task.created_at()), task.id()));
        Ok(active.into_iter().map(Task::summary).collect())
    }

    async fn list_completed(&self, limit: usize) -> TaskRepositoryResult<Vec<TaskSummary>> {
        let state = self.read()?;
        let mut done: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| task.status().is_terminal())
            .collect();
        done.sort_by_key(|task| (Reverse(task.actual_completed_at()), task.id()));
        Ok(done.into_iter().take(limit).map(Task::summary).collect())
    }

    async fn list_completed_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut done: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| {
                task.status().is_terminal()
                    && task
                        .actual_completed_at()
                        .is_some_and(|at| start <= at && at < end)
            })
            .cloned()
            .collect();
        done.sort_by_key(|task| (task.actual_completed_at(), task.id()));
        Ok(done)
    }

    async fn list_all(&self) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.read()?;
        let mut tasks: Vec<Task> = state.tasks.values().cloned().collect();
        tasks.sort_by_key(|task| (task.created_at(), task.id()));
        Ok(tasks)
    }

    async fn worklogs_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TaskRepositoryResult<Vec<Worklog>> {
        let state = self.read()?;
        let mut logs: Vec<Worklog> = state
            .worklogs
            .iter()
            .filter(|log| start <= log.created_at() && log.created_at() < end)
            .cloned()
            .collect();
        logs.sort_by_key(Worklog::created_at);
        Ok(logs)
    }

    async fn worklogs_for(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Worklog>> {
        let state = self.read()?;
        Ok(state.logs_of(task_id))
    }

    async fn record_progress(
        &self,
        id: TaskId,
        entry: ProgressEntry,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<ProgressOutcome> {
        let mut state = self.write()?;
        let current = state
            .tasks
            .get(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;

        // Work on a copy so a rejected update leaves the stored task intact.
        let mut task = current.clone();
        let worklog = task.record_progress(entry, now)?;
        state.worklogs.push(worklog.clone());
        state.tasks.insert(id, task.clone());
        Ok(ProgressOutcome { task, worklog })
    }

    async fn update_details(
        &self,
        id: TaskId,
        changes: TaskChanges,
        now: DateTime<Utc>,
    ) -> TaskRepositoryResult<Task> {
        let mut state = self.write()?;
        let current = state
            .tasks
            .get(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;

        let mut task = current.clone();
        task.apply_changes(changes, now)?;
        state.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn delete_task(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        if state.tasks.remove(&id).is_none() {
            return Err(TaskRepositoryError::NotFound(id));
        }
        state.worklogs.retain(|log| log.task_id() != id);
        Ok(())
    }

    async fn delete_worklog(&self, id: WorklogId) -> TaskRepositoryResult<()> {
        let mut state = self.write()?;
        let before = state.worklogs.len();
        state.worklogs.retain(|log| log.id() != id);
        if state.worklogs.len() == before {
            return Err(TaskRepositoryError::WorklogNotFound(id));
        }
        Ok(())
    }
}
