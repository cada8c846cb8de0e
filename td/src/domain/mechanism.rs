//! Scheduling mechanism names

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// The dispatch policy a submission asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SchedulingMechanism {
    #[default]
    #[serde(rename = "FIFO")]
    Fifo,
    #[serde(rename = "RoundRobin")]
    RoundRobin,
    #[serde(rename = "LRU")]
    Lru,
}

impl SchedulingMechanism {
    /// Every mechanism, in fallback order used when draining policies
    pub const ALL: [SchedulingMechanism; 3] = [Self::Fifo, Self::RoundRobin, Self::Lru];

    /// Wire name (`FIFO`, `RoundRobin`, `LRU`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::RoundRobin => "RoundRobin",
            Self::Lru => "LRU",
        }
    }

    /// Stable index used for compact encodings
    pub(crate) fn index(&self) -> u8 {
        match self {
            Self::Fifo => 0,
            Self::RoundRobin => 1,
            Self::Lru => 2,
        }
    }

    pub(crate) fn from_index(index: u8) -> Self {
        match index {
            1 => Self::RoundRobin,
            2 => Self::Lru,
            _ => Self::Fifo,
        }
    }
}

impl std::fmt::Display for SchedulingMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SchedulingMechanism {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fifo" => Ok(Self::Fifo),
            "roundrobin" | "round-robin" | "round_robin" | "rr" => Ok(Self::RoundRobin),
            "lru" => Ok(Self::Lru),
            _ => Err(ValidationError::UnknownMechanism(s.to_string())),
        }
    }
}
