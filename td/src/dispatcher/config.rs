//! Dispatcher and executor configuration

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Executions allowed to run at once. With 1, tasks finish in exactly
    /// the order the policies release them.
    #[serde(rename = "max-concurrent", default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Routed-but-undispatched tasks held across all policies. Beyond
    /// this the dispatcher stops pulling from the submission queue and
    /// submitters start to block.
    #[serde(rename = "max-backlog", default = "default_max_backlog")]
    pub max_backlog: usize,
}

fn default_max_concurrent() -> usize {
    debug!("default_max_concurrent: called");
    1
}

fn default_max_backlog() -> usize {
    debug!("default_max_backlog: called");
    100
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            max_backlog: 100,
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(eyre!("dispatcher.max-concurrent must be at least 1"));
        }
        if self.max_backlog == 0 {
            return Err(eyre!("dispatcher.max-backlog must be at least 1"));
        }
        Ok(())
    }
}

/// Simulated execution parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Shortest simulated run
    #[serde(rename = "min-duration-ms")]
    pub min_duration_ms: u64,

    /// Longest simulated run
    #[serde(rename = "max-duration-ms")]
    pub max_duration_ms: u64,

    /// Probability in [0, 1] that a run ends as failed
    #[serde(rename = "failure-rate")]
    pub failure_rate: f64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 50,
            max_duration_ms: 250,
            failure_rate: 0.0,
        }
    }
}

impl ExecutorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_duration_ms > self.max_duration_ms {
            return Err(eyre!(
                "executor.min-duration-ms ({}) exceeds executor.max-duration-ms ({})",
                self.min_duration_ms,
                self.max_duration_ms
            ));
        }
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(eyre!(
                "executor.failure-rate must be within [0, 1], got {}",
                self.failure_rate
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DispatcherConfig::default().validate().is_ok());
        assert!(ExecutorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = DispatcherConfig {
            max_concurrent: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DispatcherConfig {
            max_backlog: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_executor_ranges() {
        let inverted = ExecutorConfig {
            min_duration_ms: 10,
            max_duration_ms: 5,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let bad_rate = ExecutorConfig {
            failure_rate: 1.5,
            ..Default::default()
        };
        assert!(bad_rate.validate().is_err());
    }

    #[test]
    fn test_deserialize_kebab_keys() {
        let yaml = "min-duration-ms: 0\nmax-duration-ms: 0\nfailure-rate: 0.25\n";
        let config: ExecutorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_duration_ms, 0);
        assert_eq!(config.failure_rate, 0.25);

        let dispatcher: DispatcherConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(dispatcher.max_concurrent, 1);
        assert_eq!(dispatcher.max_backlog, 100);
    }
}
