//! Dispatch counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::domain::SchedulingMechanism;

/// Counters updated by the dispatcher and read by anyone
#[derive(Debug, Default)]
pub struct DispatchStats {
    routed: [AtomicU64; 3],
    dispatched: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    evicted: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchStatsSnapshot {
    pub routed_fifo: u64,
    pub routed_round_robin: u64,
    pub routed_lru: u64,
    pub dispatched: u64,
    pub completed: u64,
    pub failed: u64,
    pub evicted: u64,
}

impl DispatchStatsSnapshot {
    pub fn routed(&self) -> u64 {
        self.routed_fifo + self.routed_round_robin + self.routed_lru
    }
}

impl DispatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_routed(&self, mechanism: SchedulingMechanism) {
        self.routed[mechanism.index() as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_finished(&self, succeeded: bool) {
        let counter = if succeeded { &self.completed } else { &self.failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evicted(&self) {
        self.evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        let routed = |m: SchedulingMechanism| self.routed[m.index() as usize].load(Ordering::Relaxed);
        DispatchStatsSnapshot {
            routed_fifo: routed(SchedulingMechanism::Fifo),
            routed_round_robin: routed(SchedulingMechanism::RoundRobin),
            routed_lru: routed(SchedulingMechanism::Lru),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
        }
    }
}
