use orchestrator::CycleObserver;
use orchestrator::fetch::FetchSuccess;
use std::time::Duration;
use tracing::info;

/// Logs what the grid would display.
#[derive(Debug, Default)]
pub struct GridReporter;

impl CycleObserver for GridReporter {
    fn on_fetch_succeeded(&self, index: usize, success: &FetchSuccess) {
        info!(
            index,
            bytes = success.bytes.len(),
            latency = ?success.latency,
            protocol = %success.protocol,
            "image loaded"
        );
    }

    fn on_cycle_complete(&self, average: Duration) {
        info!(
            average_ns = u64::try_from(average.as_nanos()).unwrap_or(u64::MAX),
            "images loaded, average latency {average:?}"
        );
    }
}
