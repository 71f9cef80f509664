#![forbid(unsafe_code)]

use crate::ceiling::FetchCeiling;
use crate::fetch::{FetchError, FetchSuccess};
use crate::metrics::{MetricsAggregator, MetricsState, Phase};
use crate::netlog::{NetLog, NetLogEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Receives what a cycle produces. Called from pool threads.
pub trait CycleObserver: Send + Sync {
    /// A resource arrived. This is where it would be decoded and shown.
    fn on_fetch_succeeded(&self, _index: usize, _success: &FetchSuccess) {}

    /// Every expected fetch of the cycle succeeded. Called at most once per cycle.
    fn on_cycle_complete(&self, average: Duration);
}

/// Identifies the cycle and slot a completion was dispatched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub cycle: u64,
    pub index: usize,
}

/// Cycle bookkeeping shared by the engine and every in-flight completion.
///
/// Holds the growing fetch ceiling and the latency aggregator. Starting a
/// cycle bumps the ceiling first and resets the aggregator second; neither
/// step is synchronized with completions still running from the previous
/// cycle, so callers must not start a cycle while fetches are outstanding
/// if they want an exact average.
pub struct CycleCoordinator {
    ceiling: FetchCeiling,
    metrics: MetricsAggregator,
    cycle: AtomicU64,
    observer: Arc<dyn CycleObserver>,
    netlog: Option<NetLog>,
}

impl CycleCoordinator {
    pub fn new(observer: Arc<dyn CycleObserver>, netlog: Option<NetLog>) -> Self {
        Self {
            ceiling: FetchCeiling::new(),
            metrics: MetricsAggregator::new(),
            cycle: AtomicU64::new(0),
            observer,
            netlog,
        }
    }

    /// Start a cycle over `total_resources` and return how many fetches to
    /// dispatch, together with the cycle number.
    pub fn begin_cycle(&self, total_resources: usize) -> (u64, usize) {
        let cycle = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let ceiling = self.ceiling.increment_and_get();
        let effective = ceiling.min(total_resources);
        let phase = self.metrics.reset_for_new_cycle(effective as u64);

        debug!(cycle, ceiling, effective, total_resources, ?phase, "cycle started");
        self.record(NetLogEvent::CycleStarted {
            cycle,
            effective,
            total: total_resources,
        });
        (cycle, effective)
    }

    pub fn on_fetch_succeeded(&self, ticket: Ticket, success: &FetchSuccess) {
        let current = self.current_cycle();
        if ticket.cycle != current {
            warn!(
                dispatched = ticket.cycle,
                current,
                index = ticket.index,
                "completion from an earlier cycle counted towards the current one"
            );
        }

        debug!(
            cycle = ticket.cycle,
            index = ticket.index,
            latency = ?success.latency,
            status = success.status,
            protocol = %success.protocol,
            bytes = success.bytes.len(),
            "fetch succeeded"
        );
        self.record(NetLogEvent::RequestSucceeded {
            cycle: ticket.cycle,
            index: ticket.index,
            bytes: success.bytes.len(),
            latency: success.latency,
            status: success.status,
            protocol: success.protocol.clone(),
        });
        self.observer.on_fetch_succeeded(ticket.index, success);

        let report = self.metrics.report_completion(success.latency);
        if let Some(average) = report.published {
            info!(
                cycle = current,
                completed = report.completed(),
                ?average,
                "all fetches complete"
            );
            self.record(NetLogEvent::CycleComplete {
                cycle: current,
                average,
            });
            self.observer.on_cycle_complete(average);
        }
    }

    /// Failures are logged only; they never count towards the cycle target.
    pub fn on_fetch_failed(&self, ticket: Ticket, error: &FetchError) {
        warn!(
            cycle = ticket.cycle,
            index = ticket.index,
            %error,
            "fetch failed"
        );
        self.record(NetLogEvent::RequestFailed {
            cycle: ticket.cycle,
            index: ticket.index,
            error: error.to_string(),
        });
    }

    pub fn current_cycle(&self) -> u64 {
        self.cycle.load(Ordering::SeqCst)
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling.current()
    }

    pub fn phase(&self) -> Phase {
        self.metrics.phase()
    }

    pub fn snapshot(&self) -> MetricsState {
        self.metrics.snapshot()
    }

    pub fn last_published(&self) -> Option<Duration> {
        self.metrics.last_published()
    }

    pub fn dump_info(&self) {
        let span = tracing::info_span!("coordinator dump");
        let _enter = span.enter();
        let state = self.metrics.snapshot();
        info!(
            cycle = self.current_cycle(),
            ceiling = self.ceiling(),
            target = self.metrics.target(),
            phase = ?self.metrics.phase(),
            completed = state.completed,
            total_latency = ?state.total_latency,
            last_average = ?self.metrics.last_published(),
            "current state"
        );
    }

    fn record(&self, event: NetLogEvent) {
        if let Some(netlog) = &self.netlog {
            netlog.record(&event);
        }
    }
}
