#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GridConfig {
    /// Resources to fetch, in display order.
    pub resources: Vec<String>,

    /// Seconds between automatic reloads. Zero disables the timer.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub reload_interval: Duration,

    /// Stop after this many cycles.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cycles: Option<u64>,
}
