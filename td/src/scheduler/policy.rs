//! Policy trait and the set of live policies owned by the dispatcher

use std::sync::Arc;

use tracing::debug;

use crate::cache::SharedLruCache;
use crate::domain::{SchedulingMechanism, Task, TaskId};

use super::fifo::FifoPolicy;
use super::lru::LruPolicy;
use super::round_robin::RoundRobinPolicy;

/// A dispatch policy decides ordering (and possibly eviction) of accepted
/// tasks. It never executes anything itself.
pub trait SchedulingPolicy: Send {
    /// Which mechanism this policy implements
    fn mechanism(&self) -> SchedulingMechanism;

    /// Accept a task. Returns a task dropped from consideration to make
    /// room, if the policy is bounded.
    fn enqueue(&mut self, task: Task) -> Option<Task>;

    /// Remove and return the task that should be dispatched next
    fn next(&mut self) -> Option<Task>;

    /// Number of tasks awaiting dispatch
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One instance of every policy, addressed by mechanism.
///
/// Picks rotate over the non-empty policies, so a task waiting in one
/// policy is dispatched within `ALL.len()` picks whatever traffic the
/// others receive.
pub struct PolicySet {
    fifo: FifoPolicy,
    round_robin: RoundRobinPolicy,
    lru: LruPolicy,
    cursor: usize,
}

impl PolicySet {
    pub fn new(lru_cache: Arc<SharedLruCache<TaskId, Task>>) -> Self {
        debug!("PolicySet::new: called");
        Self {
            fifo: FifoPolicy::new(),
            round_robin: RoundRobinPolicy::new(),
            lru: LruPolicy::new(lru_cache),
            cursor: 0,
        }
    }

    pub fn get_mut(&mut self, mechanism: SchedulingMechanism) -> &mut dyn SchedulingPolicy {
        match mechanism {
            SchedulingMechanism::Fifo => &mut self.fifo,
            SchedulingMechanism::RoundRobin => &mut self.round_robin,
            SchedulingMechanism::Lru => &mut self.lru,
        }
    }

    pub fn get(&self, mechanism: SchedulingMechanism) -> &dyn SchedulingPolicy {
        match mechanism {
            SchedulingMechanism::Fifo => &self.fifo,
            SchedulingMechanism::RoundRobin => &self.round_robin,
            SchedulingMechanism::Lru => &self.lru,
        }
    }

    /// Tasks waiting across all policies
    pub fn backlog(&self) -> usize {
        SchedulingMechanism::ALL.iter().map(|m| self.get(*m).len()).sum()
    }

    /// Next task from the first non-empty policy at or after the rotation
    /// cursor. The cursor then moves past the policy that was served.
    pub fn next(&mut self) -> Option<(SchedulingMechanism, Task)> {
        let count = SchedulingMechanism::ALL.len();
        for offset in 0..count {
            let slot = (self.cursor + offset) % count;
            let mechanism = SchedulingMechanism::ALL[slot];
            if let Some(task) = self.get_mut(mechanism).next() {
                debug!(%mechanism, task_id = %task.id, "PolicySet::next: picked");
                self.cursor = (slot + 1) % count;
                return Some((mechanism, task));
            }
        }
        None
    }
}
