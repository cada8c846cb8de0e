//! LRU-cache policy
//!
//! Uses the shared recency cache as its working set. Enqueueing puts the
//! task as most recently used; a full cache evicts its least recently used
//! task, which is dropped from consideration. Dispatch takes the most
//! recently touched task first.

use std::sync::Arc;

use crate::cache::SharedLruCache;
use crate::domain::{SchedulingMechanism, Task, TaskId};

use super::policy::SchedulingPolicy;

pub struct LruPolicy {
    cache: Arc<SharedLruCache<TaskId, Task>>,
}

impl LruPolicy {
    pub fn new(cache: Arc<SharedLruCache<TaskId, Task>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<SharedLruCache<TaskId, Task>> {
        &self.cache
    }
}

impl SchedulingPolicy for LruPolicy {
    fn mechanism(&self) -> SchedulingMechanism {
        SchedulingMechanism::Lru
    }

    fn enqueue(&mut self, task: Task) -> Option<Task> {
        self.cache.put(task.id, task).map(|(_, evicted)| evicted)
    }

    fn next(&mut self) -> Option<Task> {
        self.cache.pop_mru().map(|(_, task)| task)
    }

    fn len(&self) -> usize {
        self.cache.len()
    }
}
