//! Daemon assembly
//!
//! Wires registry, queue, selector, LRU working set, event bus and the
//! dispatcher task together and hands back a [`TaskService`].

use std::sync::Arc;

use eyre::{Context, Result};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedLruCache;
use crate::config::Config;
use crate::dispatcher::{DispatchStats, DispatchStatsSnapshot, Dispatcher, DispatcherParts, Executor};
use crate::events::{EventBus, create_event_bus};
use crate::queue::submission_queue;
use crate::registry::{TaskRegistry, WorkerRegistry};
use crate::scheduler::MechanismSelector;
use crate::service::{ServiceParts, TaskService};

/// A running dispatcher and the service that feeds it
pub struct Daemon {
    service: TaskService,
    events: Arc<EventBus>,
    shutdown_tx: oneshot::Sender<()>,
    dispatcher: JoinHandle<DispatchStatsSnapshot>,
}

impl Daemon {
    /// Build every component and start the dispatcher on the current runtime
    pub fn spawn(config: &Config, executor: Arc<dyn Executor>) -> Result<Self> {
        debug!(?config, "Daemon::spawn: called");
        config.validate().context("Invalid configuration")?;

        let (sender, receiver) = submission_queue(config.queue.capacity);
        let registry = Arc::new(TaskRegistry::new());
        let workers = Arc::new(WorkerRegistry::new());
        let selector = Arc::new(MechanismSelector::new(
            config.scheduler.selector,
            config.scheduler.default_mechanism,
        ));
        let lru_cache = Arc::new(SharedLruCache::new(config.scheduler.lru_capacity()?));
        let events = create_event_bus();
        let stats = Arc::new(DispatchStats::new());

        let dispatcher = Dispatcher::new(DispatcherParts {
            config: config.dispatcher.clone(),
            receiver,
            registry: Arc::clone(&registry),
            workers: Arc::clone(&workers),
            selector: Arc::clone(&selector),
            lru_cache: Arc::clone(&lru_cache),
            executor,
            events: Arc::clone(&events),
            stats: Arc::clone(&stats),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let dispatcher = tokio::spawn(dispatcher.run_until(async move {
            let _ = shutdown_rx.await;
        }));

        let service = TaskService::new(ServiceParts {
            registry,
            workers,
            selector,
            lru_cache,
            events: Arc::clone(&events),
            stats,
            sender,
            default_mechanism: config.scheduler.default_mechanism,
        });

        info!(
            queue_capacity = config.queue.capacity,
            lru_capacity = config.scheduler.lru_capacity,
            selector = ?config.scheduler.selector,
            max_concurrent = config.dispatcher.max_concurrent,
            "Daemon started"
        );
        Ok(Self {
            service,
            events,
            shutdown_tx,
            dispatcher,
        })
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Close the queue, let the dispatcher drain queued and in-flight work,
    /// and return its final counters
    pub async fn shutdown(self) -> Result<DispatchStatsSnapshot> {
        debug!("Daemon::shutdown: called");
        let _ = self.shutdown_tx.send(());
        drop(self.service);

        let stats = self.dispatcher.await.context("Dispatcher task failed")?;
        info!(?stats, "Daemon stopped");
        Ok(stats)
    }
}
