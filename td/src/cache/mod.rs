//! Bounded recency cache
//!
//! [`LruCache`] is the single-owner structure with O(1) get/put/evict.
//! [`SharedLruCache`] puts it behind a private mutex so submission handlers
//! and the dispatcher can touch the same working set.

mod lru;
mod shared;

pub use lru::{Iter, LruCache};
pub use shared::SharedLruCache;
