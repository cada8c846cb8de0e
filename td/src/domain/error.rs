//! Domain-level error types

use thiserror::Error;

use super::id::TaskId;
use super::task::TaskStatus;

/// Rejected input on submission or registration. Nothing is created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("taskStream must not be empty")]
    EmptyStream,

    #[error("worker name must not be empty")]
    EmptyWorkerName,

    #[error("unknown scheduling mechanism: {0} (expected FIFO, RoundRobin or LRU)")]
    UnknownMechanism(String),

    #[error("invalid task id: {0}")]
    InvalidId(String),
}

/// A status change that would move a task backwards or out of a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task {id}: illegal status transition {from} -> {to}")]
pub struct TransitionError {
    pub id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
}
