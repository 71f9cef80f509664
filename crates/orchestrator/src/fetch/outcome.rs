#![forbid(unsafe_code)]

use std::time::Duration;

#[derive(Clone, PartialEq, Eq)]
pub struct FetchSuccess {
    pub bytes: Vec<u8>,
    /// Request start to end of body.
    pub latency: Duration,
    pub status: u16,
    /// Negotiated protocol, e.g. `HTTP/2.0`.
    pub protocol: String,
}

impl std::fmt::Debug for FetchSuccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchSuccess")
            .field("bytes", &self.bytes.len())
            .field("latency", &self.latency)
            .field("status", &self.status)
            .field("protocol", &self.protocol)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("fetch cancelled")]
    Cancelled,
}

pub type FetchResult = Result<FetchSuccess, FetchError>;
