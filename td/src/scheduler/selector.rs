//! Mechanism selection
//!
//! `PerSubmission` routes every task by the mechanism it was submitted
//! with. `Shared` keeps one process-wide value that every submission
//! overwrites and the dispatcher reads at routing time, so concurrent
//! submissions asking for different mechanisms race and a task may be
//! routed by somebody else's choice. `Shared` exists for compatibility
//! with clients that depend on "last submission wins".

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::SchedulingMechanism;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SelectorMode {
    #[default]
    PerSubmission,
    Shared,
}

#[derive(Debug)]
pub struct MechanismSelector {
    mode: SelectorMode,
    shared: AtomicU8,
}

impl MechanismSelector {
    pub fn new(mode: SelectorMode, initial: SchedulingMechanism) -> Self {
        debug!(?mode, %initial, "MechanismSelector::new: called");
        Self {
            mode,
            shared: AtomicU8::new(initial.index()),
        }
    }

    pub fn mode(&self) -> SelectorMode {
        self.mode
    }

    /// Called on every submission
    pub fn record(&self, requested: SchedulingMechanism) {
        if self.mode == SelectorMode::Shared {
            self.shared.store(requested.index(), Ordering::Relaxed);
        }
    }

    /// Called by the dispatcher for every dequeued submission
    pub fn resolve(&self, submitted: SchedulingMechanism) -> SchedulingMechanism {
        match self.mode {
            SelectorMode::PerSubmission => submitted,
            SelectorMode::Shared => SchedulingMechanism::from_index(self.shared.load(Ordering::Relaxed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_submission_uses_carried_mechanism() {
        let selector = MechanismSelector::new(SelectorMode::PerSubmission, SchedulingMechanism::Fifo);
        selector.record(SchedulingMechanism::Lru);
        assert_eq!(
            selector.resolve(SchedulingMechanism::RoundRobin),
            SchedulingMechanism::RoundRobin
        );
    }

    #[test]
    fn test_shared_last_writer_wins() {
        let selector = MechanismSelector::new(SelectorMode::Shared, SchedulingMechanism::Fifo);
        assert_eq!(selector.resolve(SchedulingMechanism::Lru), SchedulingMechanism::Fifo);

        selector.record(SchedulingMechanism::RoundRobin);
        selector.record(SchedulingMechanism::Lru);

        // Earlier submission asked for RoundRobin but routing sees LRU
        assert_eq!(selector.resolve(SchedulingMechanism::RoundRobin), SchedulingMechanism::Lru);
    }
}
