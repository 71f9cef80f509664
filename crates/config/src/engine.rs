#![forbid(unsafe_code)]

use crate::cache_mode::HttpCacheMode;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuicHint {
    pub host: String,
    pub port: u16,
    pub alternate_port: u16,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// User-Agent sent with every request.
    pub user_agent: String,

    pub http2: bool,

    pub quic: bool,

    /// Brotli content decoding (off by default in most transports).
    pub brotli: bool,

    pub cache: HttpCacheMode,

    /// Maximum cache size in bytes.
    pub cache_max_size: u64,

    /// Storage directory. Required when `cache` is a disk mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub timeout: Duration,

    pub quic_hints: Vec<QuicHint>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_agent: "gridload".into(),
            http2: true,
            quic: true,
            brotli: true,
            cache: HttpCacheMode::default(),
            cache_max_size: 100 * 1024,
            storage_path: None,
            timeout: Duration::from_secs(30),
            quic_hints: Vec::new(),
        }
    }
}
