#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::error::Error;
use crate::fetch::{FetchError, FetchResult, FetchSuccess, Fetcher};
use async_trait::async_trait;
use config::{EngineConfig, HttpCacheMode};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// [`Fetcher`] backed by a shared `reqwest` client.
///
/// One client is built per engine and reused by every request so that
/// connections, TLS sessions and negotiated protocols carry over between
/// cycles.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HttpFetcher {
    pub fn new(config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .brotli(config.brotli)
            .gzip(true)
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true);
        if !config.http2 {
            builder = builder.http1_only();
        }

        if config.quic || !config.quic_hints.is_empty() {
            debug!(
                hints = config.quic_hints.len(),
                "QUIC is not available over this transport; using TCP"
            );
        }
        if config.cache.is_disk() && config.storage_path.is_none() {
            warn!(mode = ?config.cache, "disk cache mode configured without a storage path");
        }
        if config.cache != HttpCacheMode::Disabled {
            debug!(
                mode = ?config.cache,
                max_size = config.cache_max_size,
                storage = ?config.storage_path,
                "response caching is left to intermediaries"
            );
        }

        Ok(Self {
            client: builder.build()?,
            clock,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        let start = self.clock.now();
        trace!(%url, "request started");

        let response = self.client.get(url.clone()).send().await.map_err(|err| {
            debug!(
                %url,
                error = %err,
                is_connect = err.is_connect(),
                is_timeout = err.is_timeout(),
                "request failed"
            );
            FetchError::Transport(err.to_string())
        })?;

        let status = response.status();
        let protocol = format!("{:?}", response.version());
        debug!(%url, status = status.as_u16(), %protocol, "response started");

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| FetchError::Body(err.to_string()))?;
        let latency = self.clock.since(start);

        debug!(%url, bytes = bytes.len(), ?latency, "request completed");
        Ok(FetchSuccess {
            bytes: bytes.to_vec(),
            latency,
            status: status.as_u16(),
            protocol,
        })
    }
}
