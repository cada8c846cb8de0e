//! Task service
//!
//! The submission and query operations shared by the HTTP handlers and the
//! integration tests. Cheap to clone; every clone feeds the same queue.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::SharedLruCache;
use crate::dispatcher::{DispatchStats, DispatchStatsSnapshot};
use crate::domain::{SchedulingMechanism, Task, TaskId, ValidationError, Worker};
use crate::events::{EventBus, TaskEvent};
use crate::queue::{QueueClosed, Submission, SubmissionSender};
use crate::registry::{RegistryError, TaskRegistry, TaskSnapshot, WorkerRegistry};
use crate::scheduler::MechanismSelector;

/// Body of a task submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "taskStream", default)]
    pub stream: String,
}

impl SubmitRequest {
    pub fn new(name: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stream: stream.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The task was registered but never reached the dispatcher
    #[error("task {0} registered but not queued: dispatcher is shut down")]
    QueueClosed(TaskId),
}

/// Dispatcher counters plus live queue depth
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatcherStatus {
    #[serde(flatten)]
    pub stats: DispatchStatsSnapshot,
    pub queue_capacity: usize,
    pub queue_available: usize,
    pub lru_working_set: usize,
}

#[derive(Clone)]
pub struct TaskService {
    registry: Arc<TaskRegistry>,
    workers: Arc<WorkerRegistry>,
    selector: Arc<MechanismSelector>,
    lru_cache: Arc<SharedLruCache<TaskId, Task>>,
    events: Arc<EventBus>,
    stats: Arc<DispatchStats>,
    sender: SubmissionSender,
    default_mechanism: SchedulingMechanism,
}

/// Shared handles a `TaskService` is built from
pub struct ServiceParts {
    pub registry: Arc<TaskRegistry>,
    pub workers: Arc<WorkerRegistry>,
    pub selector: Arc<MechanismSelector>,
    pub lru_cache: Arc<SharedLruCache<TaskId, Task>>,
    pub events: Arc<EventBus>,
    pub stats: Arc<DispatchStats>,
    pub sender: SubmissionSender,
    pub default_mechanism: SchedulingMechanism,
}

impl TaskService {
    pub fn new(parts: ServiceParts) -> Self {
        debug!(default_mechanism = %parts.default_mechanism, "TaskService::new: called");
        Self {
            registry: parts.registry,
            workers: parts.workers,
            selector: parts.selector,
            lru_cache: parts.lru_cache,
            events: parts.events,
            stats: parts.stats,
            sender: parts.sender,
            default_mechanism: parts.default_mechanism,
        }
    }

    /// Validate, register, and queue a task. Waits while the queue is full.
    ///
    /// The task is visible in the registry before it is queued. If the
    /// queue turns out to be closed it stays registered as pending.
    pub async fn submit(
        &self,
        request: SubmitRequest,
        mechanism: Option<SchedulingMechanism>,
    ) -> Result<Task, SubmitError> {
        debug!(name = %request.name, stream = %request.stream, ?mechanism, "TaskService::submit: called");
        let task = Task::new(request.name, request.stream)?;
        let mechanism = mechanism.unwrap_or(self.default_mechanism);

        self.registry.insert(task.clone()).await?;
        self.selector.record(mechanism);
        self.events.emit(TaskEvent::Submitted {
            task_id: task.id,
            stream: task.stream.clone(),
            mechanism,
            at: Utc::now(),
        });

        let submission = Submission {
            task: task.clone(),
            mechanism,
        };
        if let Err(QueueClosed) = self.sender.send(submission).await {
            warn!(task_id = %task.id, "Submission queue closed, task left pending");
            return Err(SubmitError::QueueClosed(task.id));
        }

        info!(task_id = %task.id, name = %task.name, %mechanism, "Task accepted");
        Ok(task)
    }

    /// Every task in submission order plus counts by status
    pub async fn query(&self) -> TaskSnapshot {
        self.registry.snapshot().await
    }

    /// Look up one task. A task still in the LRU working set counts as
    /// used and moves to the most-recent end.
    pub async fn task(&self, id: &TaskId) -> Option<Task> {
        debug!(task_id = %id, "TaskService::task: called");
        if self.lru_cache.get(id).is_some() {
            debug!(task_id = %id, "TaskService::task: promoted in LRU working set");
        }
        self.registry.get(id).await
    }

    pub async fn register_worker(&self, name: &str) -> Result<Worker, ValidationError> {
        self.workers.register(name).await
    }

    pub async fn workers(&self) -> Vec<Worker> {
        self.workers.list().await
    }

    pub fn dispatcher_status(&self) -> DispatcherStatus {
        DispatcherStatus {
            stats: self.stats.snapshot(),
            queue_capacity: self.sender.capacity(),
            queue_available: self.sender.available(),
            lru_working_set: self.lru_cache.len(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    pub fn default_mechanism(&self) -> SchedulingMechanism {
        self.default_mechanism
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;
    use crate::domain::TaskStatus;
    use crate::queue::{SubmissionReceiver, submission_queue};
    use crate::scheduler::SelectorMode;

    fn service(capacity: usize) -> (TaskService, SubmissionReceiver) {
        let (sender, receiver) = submission_queue(capacity);
        let service = TaskService::new(ServiceParts {
            registry: Arc::new(TaskRegistry::new()),
            workers: Arc::new(WorkerRegistry::new()),
            selector: Arc::new(MechanismSelector::new(
                SelectorMode::PerSubmission,
                SchedulingMechanism::Fifo,
            )),
            lru_cache: Arc::new(SharedLruCache::new(NonZeroUsize::new(4).unwrap())),
            events: Arc::new(EventBus::new(16)),
            stats: Arc::new(DispatchStats::new()),
            sender,
            default_mechanism: SchedulingMechanism::Fifo,
        });
        (service, receiver)
    }

    #[tokio::test]
    async fn test_submit_registers_and_queues() {
        let (service, mut rx) = service(4);
        let task = service
            .submit(SubmitRequest::new("build", "ci"), Some(SchedulingMechanism::Lru))
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.task.id, task.id);
        assert_eq!(queued.mechanism, SchedulingMechanism::Lru);
        assert_eq!(service.query().await.counts.pending, 1);
    }

    #[tokio::test]
    async fn test_submit_defaults_mechanism() {
        let (service, mut rx) = service(4);
        service.submit(SubmitRequest::new("a", "s"), None).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().mechanism, SchedulingMechanism::Fifo);
    }

    #[tokio::test]
    async fn test_invalid_submission_creates_nothing() {
        let (service, mut rx) = service(4);
        let err = service.submit(SubmitRequest::new("", "s"), None).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ValidationError::EmptyName)));

        let err = service.submit(SubmitRequest::new("a", " "), None).await.unwrap_err();
        assert!(matches!(err, SubmitError::Validation(ValidationError::EmptyStream)));

        assert!(service.query().await.tasks.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_queue_leaves_task_registered() {
        let (service, mut rx) = service(4);
        rx.close();

        let err = service.submit(SubmitRequest::new("a", "s"), None).await.unwrap_err();
        let SubmitError::QueueClosed(id) = err else {
            panic!("expected QueueClosed, got {err:?}");
        };
        assert_eq!(service.task(&id).await.unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_dispatcher_status_reports_queue_depth() {
        let (service, _rx) = service(4);
        service.submit(SubmitRequest::new("a", "s"), None).await.unwrap();

        let status = service.dispatcher_status();
        assert_eq!(status.queue_capacity, 4);
        assert_eq!(status.queue_available, 3);

        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["queueCapacity"], 4);
        assert_eq!(value["dispatched"], 0);
    }

    #[test]
    fn test_submit_request_wire_names() {
        let request: SubmitRequest = serde_json::from_str(r#"{"name":"a","taskStream":"s"}"#).unwrap();
        assert_eq!(request.stream, "s");

        let missing: SubmitRequest = serde_json::from_str("{}").unwrap();
        assert!(missing.name.is_empty());
    }
}
