//! Dispatcher
//!
//! The single background consumer of the submission queue. Each dequeued
//! submission is routed to a scheduling policy; the dispatcher then pulls
//! tasks back out of the policies in their chosen order and hands them to
//! an [`Executor`], writing the outcome into the task registry.

mod config;
mod core;
mod executor;
mod stats;

pub use config::{DispatcherConfig, ExecutorConfig};
pub use core::{Dispatcher, DispatcherParts};
pub use executor::{Executor, SimulatedExecutor};
pub use stats::{DispatchStats, DispatchStatsSnapshot};
