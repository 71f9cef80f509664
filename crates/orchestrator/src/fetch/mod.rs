#![forbid(unsafe_code)]

mod http;
mod outcome;

pub use http::HttpFetcher;
pub use outcome::{FetchError, FetchResult, FetchSuccess};

use async_trait::async_trait;
use reqwest::Url;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve one resource into memory.
    ///
    /// Redirects, protocol negotiation and body streaming are the
    /// implementation's business; callers only see the resolved result.
    async fn fetch(&self, url: &Url) -> FetchResult;
}
