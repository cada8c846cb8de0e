//! In-memory registries
//!
//! [`TaskRegistry`] is the source of truth for every submitted task and its
//! status. [`WorkerRegistry`] tracks worker identities that dispatches are
//! labelled with.

mod tasks;
mod workers;

pub use tasks::{RegistryError, StatusCounts, TaskRegistry, TaskSnapshot};
pub use workers::WorkerRegistry;
