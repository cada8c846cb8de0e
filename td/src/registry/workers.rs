//! Worker registry
//!
//! Keeps registered workers in registration order and hands them out
//! round-robin so each dispatch can be labelled with a worker.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{ValidationError, Worker, WorkerId, WorkerStatus};

#[derive(Default)]
pub struct WorkerRegistry {
    workers: RwLock<Vec<Worker>>,
    cursor: AtomicUsize,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, name: &str) -> Result<Worker, ValidationError> {
        debug!(%name, "WorkerRegistry::register: called");
        let worker = Worker::new(name)?;
        self.workers.write().await.push(worker.clone());
        info!(worker_id = %worker.id, name = %worker.name, "Worker registered");
        Ok(worker)
    }

    pub async fn list(&self) -> Vec<Worker> {
        self.workers.read().await.clone()
    }

    /// Mark a dispatch as running on `id`. Returns false when the worker is unknown.
    pub async fn claim(&self, id: &WorkerId) -> bool {
        debug!(worker_id = %id, "WorkerRegistry::claim: called");
        self.update(id, |worker| {
            worker.active_tasks += 1;
            worker.status = WorkerStatus::Busy;
        })
        .await
    }

    /// Undo one `claim`; the worker goes idle once nothing runs on it
    pub async fn release(&self, id: &WorkerId) -> bool {
        debug!(worker_id = %id, "WorkerRegistry::release: called");
        self.update(id, |worker| {
            worker.active_tasks = worker.active_tasks.saturating_sub(1);
            if worker.active_tasks == 0 {
                worker.status = WorkerStatus::Idle;
            }
        })
        .await
    }

    async fn update(&self, id: &WorkerId, apply: impl FnOnce(&mut Worker)) -> bool {
        let mut workers = self.workers.write().await;
        match workers.iter_mut().find(|w| w.id == *id) {
            Some(worker) => {
                apply(worker);
                true
            }
            None => false,
        }
    }

    /// Take the next worker in rotation and claim it under one lock, so the
    /// returned label always has the dispatch counted against it
    pub async fn claim_next(&self) -> Option<Worker> {
        let mut workers = self.workers.write().await;
        if workers.is_empty() {
            return None;
        }
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        let len = workers.len();
        let worker = &mut workers[turn % len];
        worker.active_tasks += 1;
        worker.status = WorkerStatus::Busy;
        debug!(worker_id = %worker.id, active_tasks = worker.active_tasks, "WorkerRegistry::claim_next: claimed");
        Some(worker.clone())
    }

    /// Next worker in rotation, or None when nobody is registered
    pub async fn next_worker(&self) -> Option<Worker> {
        let workers = self.workers.read().await;
        if workers.is_empty() {
            return None;
        }
        let turn = self.cursor.fetch_add(1, Ordering::Relaxed);
        workers.get(turn % workers.len()).cloned()
    }
}
