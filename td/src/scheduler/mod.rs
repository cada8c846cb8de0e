//! Scheduling policies
//!
//! Three interchangeable dispatch policies (FIFO, Round-Robin, LRU) behind
//! the [`SchedulingPolicy`] trait, plus the selector that decides which one
//! a dequeued submission is routed to.

mod config;
mod fifo;
mod lru;
mod policy;
mod round_robin;
mod selector;

pub use config::SchedulerConfig;
pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use policy::{PolicySet, SchedulingPolicy};
pub use round_robin::RoundRobinPolicy;
pub use selector::{MechanismSelector, SelectorMode};
