//! Event vocabulary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{SchedulingMechanism, TaskId, TaskStatus};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskEvent {
    /// Registered and on its way to the submission queue
    Submitted {
        task_id: TaskId,
        stream: String,
        mechanism: SchedulingMechanism,
        at: DateTime<Utc>,
    },
    /// Taken off a policy and handed to the executor
    Dispatched {
        task_id: TaskId,
        stream: String,
        mechanism: SchedulingMechanism,
        worker: Option<String>,
        at: DateTime<Utc>,
    },
    /// Executor reported a terminal status
    Finished {
        task_id: TaskId,
        status: TaskStatus,
        error: Option<String>,
        at: DateTime<Utc>,
    },
    /// Dropped from the LRU working set; stays pending in the registry
    Evicted { task_id: TaskId, at: DateTime<Utc> },
}

impl TaskEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Submitted { task_id, .. }
            | Self::Dispatched { task_id, .. }
            | Self::Finished { task_id, .. }
            | Self::Evicted { task_id, .. } => *task_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Submitted { .. } => "Submitted",
            Self::Dispatched { .. } => "Dispatched",
            Self::Finished { .. } => "Finished",
            Self::Evicted { .. } => "Evicted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = TaskEvent::Evicted {
            task_id: TaskId::new(),
            at: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "Evicted");
        assert_eq!(value["task_id"], event.task_id().to_string());
    }
}
