//! Domain types for taskdispatch
//!
//! Core domain types: Task, TaskStatus, SchedulingMechanism, Worker.
//! IDs are UUID v7 newtypes so they sort by creation time.

mod error;
mod id;
mod mechanism;
mod task;
mod worker;

pub use error::{TransitionError, ValidationError};
pub use id::{TaskId, WorkerId};
pub use mechanism::SchedulingMechanism;
pub use task::{Task, TaskStatus};
pub use worker::{Worker, WorkerStatus};
