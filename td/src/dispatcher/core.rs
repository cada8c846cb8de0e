//! Dispatcher loop

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::cache::SharedLruCache;
use crate::domain::{SchedulingMechanism, Task, TaskId, TaskStatus, WorkerId};
use crate::events::{EventBus, TaskEvent};
use crate::queue::{Submission, SubmissionReceiver, TryRecvError};
use crate::registry::{TaskRegistry, WorkerRegistry};
use crate::scheduler::{MechanismSelector, PolicySet};

use super::config::DispatcherConfig;
use super::executor::Executor;
use super::stats::{DispatchStats, DispatchStatsSnapshot};

/// Everything the dispatcher needs, assembled by the daemon
pub struct DispatcherParts {
    pub config: DispatcherConfig,
    pub receiver: SubmissionReceiver,
    pub registry: Arc<TaskRegistry>,
    pub workers: Arc<WorkerRegistry>,
    pub selector: Arc<MechanismSelector>,
    pub lru_cache: Arc<SharedLruCache<TaskId, Task>>,
    pub executor: Arc<dyn Executor>,
    pub events: Arc<EventBus>,
    pub stats: Arc<DispatchStats>,
}

/// State shared with spawned executions
#[derive(Clone)]
struct Reporter {
    registry: Arc<TaskRegistry>,
    workers: Arc<WorkerRegistry>,
    events: Arc<EventBus>,
    stats: Arc<DispatchStats>,
}

pub struct Dispatcher {
    receiver: SubmissionReceiver,
    policies: PolicySet,
    selector: Arc<MechanismSelector>,
    executor: Arc<dyn Executor>,
    slots: Arc<Semaphore>,
    max_backlog: usize,
    reporter: Reporter,
    in_flight: JoinSet<TaskId>,
    queue_open: bool,
}

impl Dispatcher {
    pub fn new(parts: DispatcherParts) -> Self {
        debug!(max_concurrent = parts.config.max_concurrent, "Dispatcher::new: called");
        Self {
            receiver: parts.receiver,
            policies: PolicySet::new(parts.lru_cache),
            selector: parts.selector,
            executor: parts.executor,
            slots: Arc::new(Semaphore::new(parts.config.max_concurrent.max(1))),
            max_backlog: parts.config.max_backlog.max(1),
            reporter: Reporter {
                registry: parts.registry,
                workers: parts.workers,
                events: parts.events,
                stats: parts.stats,
            },
            in_flight: JoinSet::new(),
            queue_open: true,
        }
    }

    /// Drain the submission queue until every sender is gone, then finish
    /// the backlog and every in-flight execution.
    pub async fn run(self) -> DispatchStatsSnapshot {
        self.run_until(std::future::pending()).await
    }

    /// Like [`run`](Self::run), but also closes the queue when `shutdown`
    /// resolves. Submissions already queued at that point are still
    /// dispatched; later ones are refused with `QueueClosed`.
    pub async fn run_until<F>(mut self, shutdown: F) -> DispatchStatsSnapshot
    where
        F: Future<Output = ()>,
    {
        info!(max_backlog = self.max_backlog, "Dispatcher started");
        tokio::pin!(shutdown);
        let mut closing = false;

        'dispatch: loop {
            self.reap_finished();

            if self.policies.backlog() == 0 {
                if !self.queue_open {
                    break;
                }
                tokio::select! {
                    received = self.receiver.recv() => self.accept(received),
                    _ = &mut shutdown, if !closing => {
                        closing = true;
                        self.close_queue();
                    }
                }
                continue;
            }
            self.absorb_queued();

            // Keep routing while every execution slot is taken, so policies
            // see (and order, or evict) everything accepted so far.
            let permit = loop {
                let room = self.queue_open && self.policies.backlog() < self.max_backlog;
                tokio::select! {
                    biased;
                    acquired = Arc::clone(&self.slots).acquire_owned() => match acquired {
                        Ok(permit) => break permit,
                        Err(e) => {
                            error!(error = %e, "Execution slots closed, stopping dispatcher");
                            break 'dispatch;
                        }
                    },
                    received = self.receiver.recv(), if room => self.accept(received),
                    _ = &mut shutdown, if !closing => {
                        closing = true;
                        self.close_queue();
                    }
                }
            };
            self.absorb_queued();

            match self.policies.next() {
                Some((mechanism, task)) => self.dispatch(mechanism, task, permit).await,
                None => drop(permit),
            }
        }

        debug!(in_flight = self.in_flight.len(), "Dispatcher::run: awaiting in-flight executions");
        while let Some(joined) = self.in_flight.join_next().await {
            Self::log_joined(joined);
        }

        let stats = self.reporter.stats.snapshot();
        info!(dispatched = stats.dispatched, completed = stats.completed, failed = stats.failed, "Dispatcher stopped");
        stats
    }

    fn accept(&mut self, received: Option<Submission>) {
        match received {
            Some(submission) => self.route(submission),
            None => {
                debug!("Dispatcher::accept: submission queue closed");
                self.queue_open = false;
            }
        }
    }

    fn close_queue(&mut self) {
        info!("Shutdown requested, closing submission queue");
        self.receiver.close();
    }

    /// Route whatever is already waiting without blocking
    fn absorb_queued(&mut self) {
        if !self.queue_open {
            return;
        }
        while self.policies.backlog() < self.max_backlog {
            match self.receiver.try_recv() {
                Ok(submission) => self.route(submission),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("Dispatcher::absorb_queued: submission queue closed");
                    self.queue_open = false;
                    break;
                }
            }
        }
    }

    fn route(&mut self, submission: Submission) {
        let Submission { task, mechanism } = submission;
        let routed = self.selector.resolve(mechanism);
        debug!(task_id = %task.id, requested = %mechanism, %routed, "Dispatcher::route: called");
        if routed != mechanism {
            debug!(task_id = %task.id, requested = %mechanism, %routed, "Dispatcher::route: shared selector overrode request");
        }

        self.reporter.stats.record_routed(routed);

        if let Some(evicted) = self.policies.get_mut(routed).enqueue(task) {
            warn!(task_id = %evicted.id, stream = %evicted.stream, "LRU working set full, task evicted without dispatch");
            self.reporter.stats.record_evicted();
            self.reporter.events.emit(TaskEvent::Evicted {
                task_id: evicted.id,
                at: Utc::now(),
            });
        }
    }

    async fn dispatch(&mut self, mechanism: SchedulingMechanism, task: Task, permit: OwnedSemaphorePermit) {
        debug!(task_id = %task.id, %mechanism, "Dispatcher::dispatch: called");
        let task = match self.reporter.registry.transition(&task.id, TaskStatus::InProgress).await {
            Ok(task) => task,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Skipping dispatch, registry rejected transition");
                return;
            }
        };

        let worker = self.reporter.workers.claim_next().await;

        self.reporter.stats.record_dispatched();
        self.reporter.events.emit(TaskEvent::Dispatched {
            task_id: task.id,
            stream: task.stream.clone(),
            mechanism,
            worker: worker.as_ref().map(|w| w.name.clone()),
            at: Utc::now(),
        });

        let executor = Arc::clone(&self.executor);
        let reporter = self.reporter.clone();
        let worker_id = worker.map(|w| w.id);
        self.in_flight.spawn(async move {
            let _permit = permit;
            let outcome = executor.execute(&task).await;
            reporter.finish(&task, worker_id, outcome).await;
            task.id
        });
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            Self::log_joined(joined);
        }
    }

    fn log_joined(joined: Result<TaskId, JoinError>) {
        match joined {
            Ok(task_id) => debug!(%task_id, "Dispatcher::reap: execution joined"),
            Err(e) => error!(error = %e, "Execution task panicked"),
        }
    }
}

impl Reporter {
    async fn finish(&self, task: &Task, worker: Option<WorkerId>, outcome: eyre::Result<()>) {
        let (status, error) = match outcome {
            Ok(()) => (TaskStatus::Completed, None),
            Err(e) => (TaskStatus::Failed, Some(format!("{e:#}"))),
        };
        debug!(task_id = %task.id, %status, "Reporter::finish: called");

        if let Err(e) = self.registry.transition(&task.id, status).await {
            warn!(task_id = %task.id, error = %e, "Failed to record execution outcome");
        }
        if let Some(worker) = worker
            && !self.workers.release(&worker).await
        {
            warn!(task_id = %task.id, worker_id = %worker, "Released worker is no longer registered");
        }

        self.stats.record_finished(status == TaskStatus::Completed);
        self.events.emit(TaskEvent::Finished {
            task_id: task.id,
            status,
            error,
            at: Utc::now(),
        });
    }
}
