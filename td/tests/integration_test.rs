//! Integration tests for taskdispatch
//!
//! These drive a real daemon (queue, dispatcher, policies, registry)
//! through `TaskService` and observe dispatch order at the executor.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taskdispatch::config::Config;
use taskdispatch::daemon::Daemon;
use taskdispatch::dispatcher::{ExecutorConfig, SimulatedExecutor};
use taskdispatch::domain::{SchedulingMechanism, Task, TaskId, TaskStatus};
use taskdispatch::events::TaskEvent;
use taskdispatch::scheduler::SelectorMode;
use taskdispatch::service::{SubmitRequest, TaskService};
use taskdispatch::Executor;
use tokio::sync::{Mutex, Semaphore};

/// Holds every execution until the test opens the gate, and records the
/// order tasks reached it
struct GatedExecutor {
    gate: Semaphore,
    order: Mutex<Vec<String>>,
}

impl GatedExecutor {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            order: Mutex::new(Vec::new()),
        })
    }

    /// Wait until `count` executions have started
    async fn wait_started(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.order.lock().await.len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("executions should start");
    }

    fn open(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    async fn order(&self) -> Vec<String> {
        self.order.lock().await.clone()
    }
}

#[async_trait]
impl Executor for GatedExecutor {
    async fn execute(&self, task: &Task) -> eyre::Result<()> {
        self.order.lock().await.push(task.name.clone());
        let permit = self.gate.acquire().await?;
        permit.forget();
        Ok(())
    }
}

fn config(lru_capacity: usize) -> Config {
    let mut config = Config::default();
    config.scheduler.lru_capacity = lru_capacity;
    config
}

async fn submit(service: &TaskService, name: &str, stream: &str, mechanism: SchedulingMechanism) -> TaskId {
    service
        .submit(SubmitRequest::new(name, stream), Some(mechanism))
        .await
        .expect("submission should be accepted")
        .id
}

/// Wait until the dispatcher has routed `count` submissions
async fn wait_routed(service: &TaskService, count: u64) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while service.dispatcher_status().stats.routed() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("dispatcher should route every submission");
}

async fn shutdown(daemon: Daemon) {
    tokio::time::timeout(Duration::from_secs(5), daemon.shutdown())
        .await
        .expect("daemon should shut down")
        .expect("dispatcher should not fail");
}

// =============================================================================
// Dispatch order
// =============================================================================

#[tokio::test]
async fn test_fifo_dispatches_in_submission_order() {
    let executor = GatedExecutor::new();
    let daemon = Daemon::spawn(&config(10), executor.clone()).unwrap();
    let service = daemon.service().clone();

    for name in ["A", "B", "C"] {
        submit(&service, name, "s", SchedulingMechanism::Fifo).await;
    }
    wait_routed(&service, 3).await;
    executor.open(3);
    shutdown(daemon).await;

    assert_eq!(executor.order().await, vec!["A", "B", "C"]);
    assert_eq!(service.query().await.counts.completed, 3);
}

#[tokio::test]
async fn test_round_robin_never_repeats_stream_while_another_waits() {
    let executor = GatedExecutor::new();
    let daemon = Daemon::spawn(&config(10), executor.clone()).unwrap();
    let service = daemon.service().clone();

    submit(&service, "x1", "X", SchedulingMechanism::RoundRobin).await;
    submit(&service, "x2", "X", SchedulingMechanism::RoundRobin).await;
    submit(&service, "y1", "Y", SchedulingMechanism::RoundRobin).await;
    wait_routed(&service, 3).await;
    executor.open(3);
    shutdown(daemon).await;

    assert_eq!(executor.order().await, vec!["x1", "y1", "x2"]);
}

#[tokio::test]
async fn test_lru_evicts_least_recent_and_leaves_it_pending() {
    let executor = GatedExecutor::new();
    let daemon = Daemon::spawn(&config(2), executor.clone()).unwrap();
    let service = daemon.service().clone();
    let mut events = service.subscribe();

    // "a" goes straight to the executor and holds the only slot
    submit(&service, "a", "s", SchedulingMechanism::Lru).await;
    executor.wait_started(1).await;
    let b = submit(&service, "b", "s", SchedulingMechanism::Lru).await;
    submit(&service, "c", "s", SchedulingMechanism::Lru).await;
    submit(&service, "d", "s", SchedulingMechanism::Lru).await;
    wait_routed(&service, 4).await;
    executor.open(4);
    shutdown(daemon).await;

    let order = executor.order().await;
    assert!(!order.contains(&"b".to_string()), "evicted task must not run: {order:?}");
    assert_eq!(order.len(), 3);
    assert_eq!(service.task(&b).await.unwrap().status, TaskStatus::Pending);
    assert_eq!(service.dispatcher_status().stats.evicted, 1);

    let mut evicted = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let TaskEvent::Evicted { task_id, .. } = event {
            evicted.push(task_id);
        }
    }
    assert_eq!(evicted, vec![b]);
}

#[tokio::test]
async fn test_lookup_promotes_task_in_lru_working_set() {
    let executor = GatedExecutor::new();
    let daemon = Daemon::spawn(&config(4), executor.clone()).unwrap();
    let service = daemon.service().clone();

    submit(&service, "blocker", "s", SchedulingMechanism::Lru).await;
    executor.wait_started(1).await;
    let older = submit(&service, "older", "s", SchedulingMechanism::Lru).await;
    submit(&service, "newer", "s", SchedulingMechanism::Lru).await;
    wait_routed(&service, 3).await;

    // Touching "older" makes it the most recently used entry
    assert!(service.task(&older).await.is_some());

    executor.open(3);
    shutdown(daemon).await;

    assert_eq!(executor.order().await, vec!["blocker", "older", "newer"]);
}

#[tokio::test]
async fn test_shared_selector_routes_by_latest_request() {
    let mut config = config(10);
    config.scheduler.selector = SelectorMode::Shared;
    let executor = GatedExecutor::new();
    let daemon = Daemon::spawn(&config, executor.clone()).unwrap();
    let service = daemon.service().clone();

    submit(&service, "first", "s", SchedulingMechanism::RoundRobin).await;
    wait_routed(&service, 1).await;
    // Each submission overwrites the shared selector before it is queued
    submit(&service, "second", "s", SchedulingMechanism::Fifo).await;
    wait_routed(&service, 2).await;
    executor.open(2);
    shutdown(daemon).await;

    let stats = service.dispatcher_status().stats;
    assert_eq!(stats.routed_round_robin, 1);
    assert_eq!(stats.routed_fifo, 1);
    assert_eq!(stats.completed, 2);
}

// =============================================================================
// Registry under concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_lose_nothing() {
    const SUBMITTERS: usize = 8;
    const PER_SUBMITTER: usize = 25;

    let mut config = config(10);
    config.queue.capacity = 16;
    config.dispatcher.max_concurrent = 4;
    let executor = Arc::new(SimulatedExecutor::new(ExecutorConfig {
        min_duration_ms: 0,
        max_duration_ms: 1,
        failure_rate: 0.0,
    }));
    let daemon = Daemon::spawn(&config, executor).unwrap();
    let service = daemon.service().clone();

    let handles: Vec<_> = (0..SUBMITTERS)
        .map(|n| {
            let service = service.clone();
            tokio::spawn(async move {
                let mut ids = Vec::new();
                for m in 0..PER_SUBMITTER {
                    let task = service
                        .submit(SubmitRequest::new(format!("task-{n}-{m}"), format!("stream-{n}")), None)
                        .await
                        .unwrap();
                    ids.push(task.id);
                }
                ids
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for result in futures::future::join_all(handles).await {
        ids.extend(result.unwrap());
    }
    assert_eq!(ids.len(), SUBMITTERS * PER_SUBMITTER);

    let snapshot = service.query().await;
    assert_eq!(snapshot.tasks.len(), SUBMITTERS * PER_SUBMITTER);
    assert_eq!(snapshot.counts.total(), snapshot.tasks.len());

    shutdown(daemon).await;
    let counts = service.query().await.counts;
    assert_eq!(counts.completed, SUBMITTERS * PER_SUBMITTER);
    assert_eq!(counts.pending + counts.in_progress + counts.failed, 0);
}

#[tokio::test]
async fn test_failed_executions_are_terminal() {
    let mut config = config(10);
    config.executor = ExecutorConfig {
        min_duration_ms: 0,
        max_duration_ms: 0,
        failure_rate: 1.0,
    };
    let executor = Arc::new(SimulatedExecutor::new(config.executor.clone()));
    let daemon = Daemon::spawn(&config, executor).unwrap();
    let service = daemon.service().clone();
    let mut events = service.subscribe();

    let id = submit(&service, "doomed", "s", SchedulingMechanism::Fifo).await;
    shutdown(daemon).await;

    assert_eq!(service.task(&id).await.unwrap().status, TaskStatus::Failed);
    let finished: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
        .filter_map(|event| match event {
            TaskEvent::Finished { status, error, .. } => Some((status, error.is_some())),
            _ => None,
        })
        .collect();
    assert_eq!(finished, vec![(TaskStatus::Failed, true)]);
}
