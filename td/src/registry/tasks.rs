//! Task registry
//!
//! An id -> Task map, an append-only log of ids in submission order, and
//! per-status counters maintained on every write. All three sit under one
//! `RwLock`: writers serialize, queries share the read side and always see
//! a consistent snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{Task, TaskId, TaskStatus, TransitionError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("task already registered: {0}")]
    Duplicate(TaskId),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Number of tasks in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.failed
    }

    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Pending => self.pending,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::Completed => self.completed,
            TaskStatus::Failed => self.failed,
        }
    }

    fn slot(&mut self, status: TaskStatus) -> &mut usize {
        match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Failed => &mut self.failed,
        }
    }

    fn record(&mut self, status: TaskStatus) {
        *self.slot(status) += 1;
    }

    fn moved(&mut self, from: TaskStatus, to: TaskStatus) {
        let from_slot = self.slot(from);
        *from_slot = from_slot.saturating_sub(1);
        *self.slot(to) += 1;
    }
}

/// Full listing plus counts, taken under one read guard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub tasks: Vec<Task>,
}

#[derive(Default)]
struct RegistryInner {
    tasks: HashMap<TaskId, Task>,
    order: Vec<TaskId>,
    counts: StatusCounts,
}

/// Shared record of every submitted task
#[derive(Default)]
pub struct TaskRegistry {
    inner: RwLock<RegistryInner>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly submitted task
    pub async fn insert(&self, task: Task) -> Result<(), RegistryError> {
        debug!(task_id = %task.id, stream = %task.stream, "TaskRegistry::insert: called");
        let mut inner = self.inner.write().await;

        if inner.tasks.contains_key(&task.id) {
            debug!(task_id = %task.id, "TaskRegistry::insert: duplicate id, rejecting");
            return Err(RegistryError::Duplicate(task.id));
        }

        inner.counts.record(task.status);
        inner.order.push(task.id);
        inner.tasks.insert(task.id, task);
        Ok(())
    }

    pub async fn get(&self, id: &TaskId) -> Option<Task> {
        self.inner.read().await.tasks.get(id).cloned()
    }

    /// Move a task forward in its lifecycle, returning the updated copy
    pub async fn transition(&self, id: &TaskId, next: TaskStatus) -> Result<Task, RegistryError> {
        debug!(task_id = %id, %next, "TaskRegistry::transition: called");
        let mut inner = self.inner.write().await;

        let task = inner.tasks.get_mut(id).ok_or(RegistryError::NotFound(*id))?;
        let previous = task.status;
        task.transition(next)?;
        let updated = task.clone();

        inner.counts.moved(previous, next);
        if next.is_terminal() {
            info!(task_id = %id, status = %next, "Task finished");
        }
        Ok(updated)
    }

    /// Ordered listing and counts in one consistent view
    pub async fn snapshot(&self) -> TaskSnapshot {
        debug!("TaskRegistry::snapshot: called");
        let inner = self.inner.read().await;
        let tasks = inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id).cloned())
            .collect();

        TaskSnapshot {
            counts: inner.counts,
            tasks,
        }
    }

    pub async fn counts(&self) -> StatusCounts {
        self.inner.read().await.counts
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.order.is_empty()
    }
}
