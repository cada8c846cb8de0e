//! Scheduler configuration

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::domain::SchedulingMechanism;

use super::selector::SelectorMode;

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Working-set size of the LRU policy
    #[serde(rename = "lru-capacity", default = "default_lru_capacity")]
    pub lru_capacity: usize,

    /// How the dispatcher picks a policy for each dequeued task
    #[serde(default)]
    pub selector: SelectorMode,

    /// Mechanism used when a submission names none
    #[serde(rename = "default-mechanism", default)]
    pub default_mechanism: SchedulingMechanism,
}

fn default_lru_capacity() -> usize {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lru_capacity: 10,
            selector: SelectorMode::PerSubmission,
            default_mechanism: SchedulingMechanism::Fifo,
        }
    }
}

impl SchedulerConfig {
    /// LRU capacity as a NonZeroUsize, if valid
    pub fn lru_capacity(&self) -> eyre::Result<NonZeroUsize> {
        NonZeroUsize::new(self.lru_capacity).ok_or_else(|| eyre::eyre!("scheduler.lru-capacity must be at least 1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.lru_capacity, 10);
        assert_eq!(config.selector, SelectorMode::PerSubmission);
        assert_eq!(config.default_mechanism, SchedulingMechanism::Fifo);
    }

    #[test]
    fn test_zero_lru_capacity_rejected() {
        let config = SchedulerConfig {
            lru_capacity: 0,
            ..Default::default()
        };
        assert!(config.lru_capacity().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SchedulerConfig = serde_yaml::from_str("selector: shared\n").unwrap();
        assert_eq!(config.selector, SelectorMode::Shared);
        assert_eq!(config.lru_capacity, 10);
    }
}
