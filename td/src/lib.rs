//! taskdispatch - task submission service with pluggable dispatch policies
//!
//! Tasks are submitted over HTTP, recorded in a registry, and pushed
//! through a bounded submission queue to a single background dispatcher.
//! The dispatcher routes each task to one of three scheduling policies
//! (FIFO, Round-Robin across streams, or an LRU working set) and executes
//! whatever the policies release, writing the outcome back to the registry.
//!
//! # Modules
//!
//! - [`cache`] - O(1) LRU cache backing the LRU policy
//! - [`scheduler`] - FIFO, Round-Robin and LRU policies plus mechanism selection
//! - [`queue`] - bounded submission queue with backpressure
//! - [`registry`] - task and worker registries
//! - [`dispatcher`] - the dispatch loop and executors
//! - [`service`] / [`daemon`] - assembly and the operations the API exposes
//! - [`api`] / [`client`] / [`cli`] - HTTP surface and command line

pub mod api;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod daemon;
pub mod dispatcher;
pub mod domain;
pub mod events;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod service;

// Re-export commonly used types
pub use cache::{LruCache, SharedLruCache};
pub use config::Config;
pub use daemon::Daemon;
pub use dispatcher::{DispatchStatsSnapshot, Dispatcher, DispatcherParts, Executor, SimulatedExecutor};
pub use domain::{SchedulingMechanism, Task, TaskId, TaskStatus, ValidationError, Worker, WorkerId};
pub use events::{EventBus, TaskEvent};
pub use queue::{Submission, submission_queue};
pub use registry::{TaskRegistry, TaskSnapshot, WorkerRegistry};
pub use scheduler::{MechanismSelector, SelectorMode};
pub use service::{SubmitError, SubmitRequest, TaskService};
