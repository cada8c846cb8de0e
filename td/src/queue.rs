//! Submission queue
//!
//! Bounded channel between request handlers and the dispatcher. A full
//! queue makes `send` wait (backpressure); blocked senders are released in
//! the order they started waiting. The queue closes when every sender has
//! been dropped.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::{SchedulingMechanism, Task};

pub use tokio::sync::mpsc::error::TryRecvError;

/// Default intake depth
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// A task on its way to the dispatcher, with the mechanism it asked for
#[derive(Debug, Clone)]
pub struct Submission {
    pub task: Task,
    pub mechanism: SchedulingMechanism,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("submission queue is closed")]
pub struct QueueClosed;

/// Create a bounded submission queue
pub fn submission_queue(capacity: usize) -> (SubmissionSender, SubmissionReceiver) {
    debug!(capacity, "submission_queue: called");
    let (tx, rx) = mpsc::channel(capacity);
    (SubmissionSender { tx, capacity }, SubmissionReceiver { rx })
}

/// Producer side, cloned into every request handler
#[derive(Debug, Clone)]
pub struct SubmissionSender {
    tx: mpsc::Sender<Submission>,
    capacity: usize,
}

impl SubmissionSender {
    /// Enqueue, waiting for a free slot when the queue is full
    pub async fn send(&self, submission: Submission) -> Result<(), QueueClosed> {
        debug!(task_id = %submission.task.id, mechanism = %submission.mechanism, "SubmissionSender::send: called");
        if self.tx.capacity() == 0 {
            debug!(task_id = %submission.task.id, "SubmissionSender::send: queue full, waiting for a slot");
        }
        self.tx.send(submission).await.map_err(|_| QueueClosed)
    }

    /// Configured queue depth
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots right now
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side, owned by the dispatcher
#[derive(Debug)]
pub struct SubmissionReceiver {
    rx: mpsc::Receiver<Submission>,
}

impl SubmissionReceiver {
    /// Wait for the next submission; `None` once the queue is closed and drained
    pub async fn recv(&mut self) -> Option<Submission> {
        self.rx.recv().await
    }

    /// Take a submission only if one is already waiting
    pub fn try_recv(&mut self) -> Result<Submission, TryRecvError> {
        self.rx.try_recv()
    }

    /// Stop accepting new submissions; queued ones can still be received
    pub fn close(&mut self) {
        self.rx.close();
    }
}
