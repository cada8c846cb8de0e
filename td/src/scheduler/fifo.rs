//! First-in, first-out policy

use std::collections::VecDeque;

use crate::domain::{SchedulingMechanism, Task};

use super::policy::SchedulingPolicy;

/// Unbounded arrival-ordered queue. Starvation-free; the default policy.
#[derive(Debug, Default)]
pub struct FifoPolicy {
    queue: VecDeque<Task>,
}

impl FifoPolicy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchedulingPolicy for FifoPolicy {
    fn mechanism(&self) -> SchedulingMechanism {
        SchedulingMechanism::Fifo
    }

    fn enqueue(&mut self, task: Task) -> Option<Task> {
        self.queue.push_back(task);
        None
    }

    fn next(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_preserves_arrival_order() {
        let mut policy = FifoPolicy::new();
        for name in ["A", "B", "C"] {
            assert!(policy.enqueue(Task::new(name, "s").unwrap()).is_none());
        }

        let order: Vec<_> = std::iter::from_fn(|| policy.next()).map(|t| t.name).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
        assert!(policy.is_empty());
    }

    #[test]
    fn test_fifo_interleaved_enqueue_and_next() {
        let mut policy = FifoPolicy::new();
        policy.enqueue(Task::new("A", "s").unwrap());
        policy.enqueue(Task::new("B", "s").unwrap());
        assert_eq!(policy.next().unwrap().name, "A");
        policy.enqueue(Task::new("C", "s").unwrap());
        assert_eq!(policy.next().unwrap().name, "B");
        assert_eq!(policy.next().unwrap().name, "C");
        assert!(policy.next().is_none());
    }
}
