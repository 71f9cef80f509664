#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Number of fetches allowed to run at the same time (at least 1).
    pub workers: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

impl ExecutorConfig {
    pub fn clamp(self) -> Self {
        Self {
            workers: self.workers.max(1),
        }
    }
}
