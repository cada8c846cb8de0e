//! Task execution

use std::time::Duration;

use async_trait::async_trait;
use eyre::{Result, eyre};
use rand::Rng;
use tracing::debug;

use crate::domain::Task;

use super::config::ExecutorConfig;

/// Runs a dispatched task. `Ok` means completed, `Err` means failed; the
/// dispatcher records either into the registry.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, task: &Task) -> Result<()>;
}

/// Sleeps for a random duration and fails at a configured rate
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutor {
    config: ExecutorConfig,
}

impl SimulatedExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        debug!(?config, "SimulatedExecutor::new: called");
        Self { config }
    }

    fn roll(&self) -> (Duration, bool) {
        let mut rng = rand::rng();
        let millis = if self.config.max_duration_ms > self.config.min_duration_ms {
            rng.random_range(self.config.min_duration_ms..=self.config.max_duration_ms)
        } else {
            self.config.min_duration_ms
        };
        let fails = rng.random_bool(self.config.failure_rate.clamp(0.0, 1.0));
        (Duration::from_millis(millis), fails)
    }
}

#[async_trait]
impl Executor for SimulatedExecutor {
    async fn execute(&self, task: &Task) -> Result<()> {
        let (duration, fails) = self.roll();
        debug!(task_id = %task.id, ?duration, fails, "SimulatedExecutor::execute: called");
        tokio::time::sleep(duration).await;

        if fails {
            return Err(eyre!("simulated failure in stream {}", task.stream));
        }
        Ok(())
    }
}
