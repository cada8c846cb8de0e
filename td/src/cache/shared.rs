//! Thread-safe wrapper around [`LruCache`]
//!
//! Each call takes the private lock once; a `put` followed by a `get` is two
//! independent critical sections.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::lru::LruCache;

pub struct SharedLruCache<K, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K, V> SharedLruCache<K, V>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(capacity: NonZeroUsize) -> Self {
        debug!(capacity = capacity.get(), "SharedLruCache::new: called");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    // A panic while holding the lock cannot leave the arena half-linked
    // (every mutation completes before returning), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, LruCache<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or promote; returns the evicted entry, if any
    pub fn put(&self, key: K, value: V) -> Option<(K, V)> {
        let evicted = self.lock().put(key, value);
        if let Some((evicted_key, _)) = &evicted {
            debug!(?evicted_key, "SharedLruCache::put: evicted least recently used");
        }
        evicted
    }

    /// Clone out the value for `key`, promoting it on a hit
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn peek(&self, key: &K) -> Option<V> {
        self.lock().peek(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().contains(key)
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key)
    }

    pub fn pop_lru(&self) -> Option<(K, V)> {
        self.lock().pop_lru()
    }

    pub fn pop_mru(&self) -> Option<(K, V)> {
        self.lock().pop_mru()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    /// Keys from least to most recently used
    pub fn keys(&self) -> Vec<K> {
        self.lock().iter().map(|(k, _)| k.clone()).collect()
    }
}
