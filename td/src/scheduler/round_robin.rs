//! Round-robin policy over task streams
//!
//! Tasks are kept per stream in arrival order; a rotation of streams that
//! have work waiting is walked one task at a time. A stream is never
//! dispatched twice in a row while another stream has a task waiting.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::domain::{SchedulingMechanism, Task};

use super::policy::SchedulingPolicy;

#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    /// Waiting tasks per stream
    lanes: HashMap<String, VecDeque<Task>>,

    /// Streams with waiting tasks, front is next in turn
    rotation: VecDeque<String>,

    /// Stream of the most recent dispatch
    last_stream: Option<String>,

    len: usize,
}

impl RoundRobinPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streams with waiting work, in turn order
    pub fn active_streams(&self) -> Vec<&str> {
        self.rotation.iter().map(String::as_str).collect()
    }
}

impl SchedulingPolicy for RoundRobinPolicy {
    fn mechanism(&self) -> SchedulingMechanism {
        SchedulingMechanism::RoundRobin
    }

    fn enqueue(&mut self, task: Task) -> Option<Task> {
        let lane = self.lanes.entry(task.stream.clone()).or_default();
        if lane.is_empty() {
            self.rotation.push_back(task.stream.clone());
        }
        lane.push_back(task);
        self.len += 1;
        None
    }

    fn next(&mut self) -> Option<Task> {
        // A stream that was alone when it last went may have been joined
        // by another one since; let the newcomer go first.
        if self.rotation.len() > 1 && self.rotation.front() == self.last_stream.as_ref() {
            self.rotation.rotate_left(1);
        }

        let stream = self.rotation.pop_front()?;
        let lane = self.lanes.get_mut(&stream)?;
        let task = lane.pop_front()?;
        self.len -= 1;

        if lane.is_empty() {
            self.lanes.remove(&stream);
        } else {
            self.rotation.push_back(stream.clone());
        }

        debug!(task_id = %task.id, %stream, "RoundRobinPolicy::next: dispatching");
        self.last_stream = Some(stream);
        Some(task)
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(policy: &mut RoundRobinPolicy) -> Vec<(String, String)> {
        std::iter::from_fn(|| policy.next()).map(|t| (t.stream, t.name)).collect()
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(s, n)| (s.to_string(), n.to_string())).collect()
    }

    #[test]
    fn test_alternates_between_streams() {
        let mut policy = RoundRobinPolicy::new();
        policy.enqueue(Task::new("x1", "X").unwrap());
        policy.enqueue(Task::new("x2", "X").unwrap());
        policy.enqueue(Task::new("y1", "Y").unwrap());

        assert_eq!(drain(&mut policy), pairs(&[("X", "x1"), ("Y", "y1"), ("X", "x2")]));
        assert!(policy.is_empty());
    }

    #[test]
    fn test_single_stream_degenerates_to_fifo() {
        let mut policy = RoundRobinPolicy::new();
        for name in ["a", "b", "c"] {
            policy.enqueue(Task::new(name, "only").unwrap());
        }
        assert_eq!(
            drain(&mut policy),
            pairs(&[("only", "a"), ("only", "b"), ("only", "c")])
        );
    }

    #[test]
    fn test_late_stream_is_not_starved() {
        let mut policy = RoundRobinPolicy::new();
        policy.enqueue(Task::new("x1", "X").unwrap());
        policy.enqueue(Task::new("x2", "X").unwrap());

        assert_eq!(policy.next().unwrap().name, "x1");

        // Y arrives after X already went; X must not go twice in a row
        policy.enqueue(Task::new("y1", "Y").unwrap());
        assert_eq!(policy.next().unwrap().name, "y1");
        assert_eq!(policy.next().unwrap().name, "x2");
    }

    #[test]
    fn test_three_streams_cycle() {
        let mut policy = RoundRobinPolicy::new();
        for (name, stream) in [("a1", "A"), ("a2", "A"), ("b1", "B"), ("c1", "C"), ("b2", "B")] {
            policy.enqueue(Task::new(name, stream).unwrap());
        }
        assert_eq!(policy.len(), 5);
        assert_eq!(policy.active_streams(), vec!["A", "B", "C"]);

        let names: Vec<_> = drain(&mut policy).into_iter().map(|(_, n)| n).collect();
        assert_eq!(names, vec!["a1", "b1", "c1", "a2", "b2"]);
    }

    #[test]
    fn test_never_same_stream_twice_while_other_waits() {
        let mut policy = RoundRobinPolicy::new();
        let arrivals = [("X", 4), ("Y", 2), ("Z", 1)];
        for (stream, count) in arrivals {
            for i in 0..count {
                policy.enqueue(Task::new(format!("{stream}{i}"), stream).unwrap());
            }
        }

        let mut remaining: HashMap<String, usize> = arrivals.iter().map(|(s, c)| (s.to_string(), *c)).collect();
        let mut previous: Option<String> = None;
        while let Some(task) = policy.next() {
            let others_waiting = remaining.iter().any(|(s, c)| *s != task.stream && *c > 0);
            if others_waiting {
                assert_ne!(previous.as_deref(), Some(task.stream.as_str()));
            }
            *remaining.get_mut(&task.stream).unwrap() -= 1;
            previous = Some(task.stream);
        }
    }
}
