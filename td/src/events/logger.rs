//! Event logger - mirrors bus traffic into the tracing log

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::bus::EventBus;
use super::types::TaskEvent;

fn log_event(event: &TaskEvent) {
    match event {
        TaskEvent::Submitted {
            task_id,
            stream,
            mechanism,
            ..
        } => info!(%task_id, %stream, %mechanism, "Task submitted"),
        TaskEvent::Dispatched {
            task_id,
            mechanism,
            worker,
            ..
        } => info!(%task_id, %mechanism, ?worker, "Task dispatched"),
        TaskEvent::Finished {
            task_id, status, error, ..
        } => match error {
            Some(error) => warn!(%task_id, %status, %error, "Task finished with error"),
            None => info!(%task_id, %status, "Task finished"),
        },
        TaskEvent::Evicted { task_id, .. } => warn!(%task_id, "Task evicted from LRU working set"),
    }
}

/// Spawn a task that logs every event until the bus is dropped
pub fn spawn_event_logger(bus: &Arc<EventBus>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        debug!("spawn_event_logger: started");
        loop {
            match rx.recv().await {
                Ok(event) => log_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!("spawn_event_logger: bus closed, exiting");
    })
}
