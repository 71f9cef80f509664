#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// What the transport is allowed to keep between requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HttpCacheMode {
    Disabled,
    InMemory,
    /// Persist protocol metadata (QUIC support, HTTP/2 hints) but not bodies.
    #[default]
    DiskNoHttp,
    Disk,
}

impl HttpCacheMode {
    pub fn is_disk(self) -> bool {
        matches!(self, Self::DiskNoHttp | Self::Disk)
    }
}
