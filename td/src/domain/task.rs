//! Task domain type
//!
//! A Task is created at submission, appended to the registry, and then only
//! ever moves forward through its status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{TransitionError, ValidationError};
use super::id::TaskId;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Accepted, waiting for the dispatcher
    #[default]
    Pending,
    /// Handed to an executor
    InProgress,
    /// Executor reported success
    Completed,
    /// Executor reported failure; terminal, never retried
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [Self::Pending, Self::InProgress, Self::Completed, Self::Failed];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// pending -> inProgress -> {completed, failed}
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress) | (Self::InProgress, Self::Completed) | (Self::InProgress, Self::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "inProgress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "inprogress" | "in_progress" | "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

/// A unit of submitted work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, immutable after submission
    pub id: TaskId,

    /// Human-readable name
    pub name: String,

    /// Classification label used by round-robin rotation
    #[serde(rename = "taskStream")]
    pub stream: String,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Creation instant (serialized as RFC 3339)
    pub timestamp: DateTime<Utc>,
}

impl Task {
    /// Create a pending task with a fresh id
    pub fn new(name: impl Into<String>, stream: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let stream = stream.into();

        // Blank means empty; accepted values are stored as submitted
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if stream.trim().is_empty() {
            return Err(ValidationError::EmptyStream);
        }

        Ok(Self {
            id: TaskId::new(),
            name,
            stream,
            status: TaskStatus::Pending,
            timestamp: Utc::now(),
        })
    }

    /// Move to `next`, refusing anything that is not a forward step
    pub fn transition(&mut self, next: TaskStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
