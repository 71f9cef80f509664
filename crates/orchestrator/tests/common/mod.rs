#![forbid(unsafe_code)]
#![allow(dead_code)]

use async_trait::async_trait;
use config::Config;
use orchestrator::clock::SystemClock;
use orchestrator::fetch::{FetchError, FetchResult, FetchSuccess, Fetcher};
use orchestrator::{CycleObserver, GridEngine, Services};
use parking_lot::Mutex;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// What a scripted resource does when fetched.
#[derive(Debug, Clone)]
pub struct Script {
    /// Reported latency, or the failure to return.
    pub outcome: Result<Duration, FetchError>,
    /// Real time to wait before completing, used to force arrival order.
    pub delay: Duration,
}

impl Script {
    pub fn ok(latency_ns: u64) -> Self {
        Self {
            outcome: Ok(Duration::from_nanos(latency_ns)),
            delay: Duration::ZERO,
        }
    }

    pub fn fail(reason: &str) -> Self {
        Self {
            outcome: Err(FetchError::Transport(reason.into())),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }
}

/// Fetcher whose results are set per resource index by the test.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<usize, Script>>,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedFetcher {
    pub fn set(&self, index: usize, script: Script) {
        self.scripts.lock().insert(index, script);
    }

    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        let index = index_of(url);
        self.calls.lock().push(index);
        let script = self
            .scripts
            .lock()
            .get(&index)
            .cloned()
            .unwrap_or_else(|| Script::ok(1));
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        script.outcome.map(|latency| FetchSuccess {
            bytes: vec![0xff; 16],
            latency,
            status: 200,
            protocol: "HTTP/2.0".into(),
        })
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    averages: Mutex<Vec<Duration>>,
    shown: Mutex<Vec<usize>>,
}

impl RecordingObserver {
    pub fn averages(&self) -> Vec<Duration> {
        self.averages.lock().clone()
    }

    pub fn shown(&self) -> Vec<usize> {
        self.shown.lock().clone()
    }
}

impl CycleObserver for RecordingObserver {
    fn on_fetch_succeeded(&self, index: usize, _success: &FetchSuccess) {
        self.shown.lock().push(index);
    }

    fn on_cycle_complete(&self, average: Duration) {
        self.averages.lock().push(average);
    }
}

pub fn resource(index: usize) -> String {
    format!("https://images.example.org/{index}.jpg")
}

pub fn index_of(url: &Url) -> usize {
    url.path()
        .trim_start_matches('/')
        .trim_end_matches(".jpg")
        .parse()
        .unwrap_or(usize::MAX)
}

pub fn config_with(total: usize) -> Config {
    let mut config = Config::default();
    config.grid.resources = (0..total).map(resource).collect();
    config
}

pub fn engine(
    config: Config,
) -> (GridEngine, Arc<ScriptedFetcher>, Arc<RecordingObserver>) {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let observer = Arc::new(RecordingObserver::default());
    let engine = GridEngine::new(
        config,
        Services {
            fetcher: fetcher.clone(),
            observer: observer.clone(),
            clock: Arc::new(SystemClock),
        },
    )
    .unwrap();
    (engine, fetcher, observer)
}

pub fn ns(n: u64) -> Duration {
    Duration::from_nanos(n)
}
