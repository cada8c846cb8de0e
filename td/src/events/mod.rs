//! Task lifecycle events
//!
//! Every significant step of a task (submitted, dispatched, finished,
//! evicted) is emitted on a broadcast bus. Subscribers are optional: the
//! server attaches a logger, tests attach receivers to observe dispatch
//! order.

mod bus;
mod logger;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, create_event_bus};
pub use logger::spawn_event_logger;
pub use types::TaskEvent;
