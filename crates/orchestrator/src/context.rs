#![forbid(unsafe_code)]

use crate::fetch::{FetchError, FetchResult, Fetcher};
use config::ExecutorConfig;
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::trace;

/// The transport and the bounded pool its completions run on.
///
/// Built once by whoever owns the engine and handed down explicitly. At most
/// `workers` fetches are in flight at a time; the rest queue on the
/// semaphore. Dropping the context cancels every queued or running fetch,
/// [`shutdown`](Self::shutdown) additionally waits for them to unwind.
pub struct FetchContext {
    fetcher: Arc<dyn Fetcher>,
    permits: Arc<Semaphore>,
    workers: usize,
    tasks: TaskTracker,
    cancel: CancellationToken,
}

impl FetchContext {
    pub fn new(executor: ExecutorConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let workers = executor.clamp().workers;
        Self {
            fetcher,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Number of dispatched fetches whose completion has not run yet.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Fetch `url` on the pool and hand the result to `on_done` exactly once.
    ///
    /// A fetch that is cancelled before it finishes completes with
    /// [`FetchError::Cancelled`].
    pub fn dispatch<F>(&self, index: usize, url: Url, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(usize, FetchResult) + Send + 'static,
    {
        let fetcher = Arc::clone(&self.fetcher);
        let permits = Arc::clone(&self.permits);
        let cancel = self.cancel.clone();

        self.tasks.spawn(async move {
            let fetch = async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return Err(FetchError::Cancelled);
                };
                trace!(index, %url, "fetch running");
                fetcher.fetch(&url).await
            };

            let result = tokio::select! {
                _ = cancel.cancelled() => Err(FetchError::Cancelled),
                result = fetch => result,
            };
            on_done(index, result);
        })
    }

    /// Cancel outstanding fetches and wait until every completion has run.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.permits.close();
        self.tasks.close();
        self.tasks.wait().await;
    }
}

impl Drop for FetchContext {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
