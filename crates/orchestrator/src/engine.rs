#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::context::FetchContext;
use crate::coordinator::{CycleCoordinator, CycleObserver, Ticket};
use crate::error::Error;
use crate::fetch::Fetcher;
use crate::metrics::Phase;
use crate::netlog::NetLog;
use crate::resources::ResourceSet;
use config::Config;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

pub struct Services {
    pub fetcher: Arc<dyn Fetcher>,
    pub observer: Arc<dyn CycleObserver>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Start a new cycle now.
    Reload,
    /// Log the current ceiling and metrics.
    DumpInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub effective: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when every expected fetch succeeded.
    pub average: Option<Duration>,
    pub phase: Phase,
}

impl CycleReport {
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Done
    }
}

pub struct GridEngine {
    config: Config,
    resources: ResourceSet,
    coordinator: Arc<CycleCoordinator>,
    context: FetchContext,
    clock: Arc<dyn Clock>,
    cycles_run: u64,
}

impl GridEngine {
    pub fn new(config: Config, services: Services) -> Result<Self, Error> {
        let resources = ResourceSet::new(&config.grid.resources)?;
        let netlog = if config.netlog.enabled {
            Some(NetLog::start(&config.netlog)?)
        } else {
            None
        };
        let coordinator = Arc::new(CycleCoordinator::new(services.observer, netlog));
        let context = FetchContext::new(config.executor, services.fetcher);

        info!(
            resources = resources.total(),
            workers = context.workers(),
            "engine ready"
        );
        Ok(Self {
            config,
            resources,
            coordinator,
            context,
            clock: services.clock,
            cycles_run: 0,
        })
    }

    pub fn resources(&self) -> &ResourceSet {
        &self.resources
    }

    pub fn coordinator(&self) -> &CycleCoordinator {
        &self.coordinator
    }

    /// Run one cycle: grow the ceiling, fetch the leading resources
    /// concurrently and wait for every fetch to finish.
    ///
    /// Returns even when some fetches failed; such a cycle reports
    /// [`Phase::Accumulating`] and no average.
    pub async fn load_cycle(&mut self) -> CycleReport {
        let (cycle, effective) = self.coordinator.begin_cycle(self.resources.total());
        let span = tracing::info_span!("cycle", cycle);
        self.cycles_run = self.cycles_run.saturating_add(1);

        async {
            let succeeded = Arc::new(AtomicUsize::new(0));
            let failed = Arc::new(AtomicUsize::new(0));
            let mut handles = Vec::with_capacity(effective);

            for (index, url) in self.resources.iter().take(effective).enumerate() {
                let coordinator = Arc::clone(&self.coordinator);
                let succeeded = Arc::clone(&succeeded);
                let failed = Arc::clone(&failed);
                let ticket = Ticket { cycle, index };

                handles.push(self.context.dispatch(index, url.clone(), move |_, result| {
                    match result {
                        Ok(success) => {
                            succeeded.fetch_add(1, Ordering::SeqCst);
                            coordinator.on_fetch_succeeded(ticket, &success);
                        }
                        Err(error) => {
                            failed.fetch_add(1, Ordering::SeqCst);
                            coordinator.on_fetch_failed(ticket, &error);
                        }
                    }
                }));
            }

            for handle in handles {
                if let Err(err) = handle.await {
                    warn!(%err, "fetch task join failed");
                    failed.fetch_add(1, Ordering::SeqCst);
                }
            }

            let phase = self.coordinator.phase();
            let average = match phase {
                Phase::Done => self.coordinator.snapshot().average(),
                _ => None,
            };
            let report = CycleReport {
                cycle,
                effective,
                succeeded: succeeded.load(Ordering::SeqCst),
                failed: failed.load(Ordering::SeqCst),
                average,
                phase,
            };
            if report.is_complete() {
                info!(effective, ?average, "cycle finished");
            } else {
                warn!(
                    effective,
                    succeeded = report.succeeded,
                    failed = report.failed,
                    "cycle finished without completing"
                );
            }
            report
        }
        .instrument(span)
        .await
    }

    /// Run cycles until cancelled or `grid.max_cycles` is reached.
    ///
    /// The first cycle starts right away. Later ones start on
    /// [`ControlEvent::Reload`] or, when `grid.reload_interval` is non-zero,
    /// once that long has passed since the previous cycle finished. Events
    /// that do not start a cycle leave the timer running.
    pub async fn run_until(
        &mut self,
        cancel: CancellationToken,
        mut control_rx: mpsc::UnboundedReceiver<ControlEvent>,
    ) -> Result<(), Error> {
        let interval = self.config.grid.reload_interval;
        let clock = Arc::clone(&self.clock);
        let mut reload_now = true;
        let mut control_open = true;
        let mut last_cycle = clock.now();

        loop {
            if reload_now {
                if self.reached_max_cycles() {
                    info!(cycles = self.cycles_run, "cycle limit reached");
                    break;
                }
                let start = clock.now();
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("shutdown requested");
                        break;
                    }
                    _ = self.load_cycle() => {}
                }
                last_cycle = clock.now();
                debug!(elapsed = ?last_cycle.saturating_duration_since(start), "cycle took");
                reload_now = false;

                if self.reached_max_cycles() {
                    info!(cycles = self.cycles_run, "cycle limit reached");
                    break;
                }
            }

            let remaining = interval.saturating_sub(clock.since(last_cycle));
            let timer = async {
                if interval.is_zero() {
                    std::future::pending::<()>().await;
                } else {
                    clock.sleep(remaining).await;
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                event = control_rx.recv(), if control_open => match event {
                    Some(ControlEvent::Reload) => {
                        debug!("reload requested");
                        reload_now = true;
                    }
                    Some(ControlEvent::DumpInfo) => self.coordinator.dump_info(),
                    None => {
                        debug!("control channel closed");
                        if interval.is_zero() {
                            break;
                        }
                        control_open = false;
                    }
                },
                _ = timer => reload_now = true,
            }
        }

        Ok(())
    }

    /// Cancel outstanding fetches, wait for them and close the net log.
    pub async fn shutdown(self) {
        let Self {
            context,
            coordinator,
            ..
        } = self;
        debug!(in_flight = context.in_flight(), "stopping fetches");
        context.shutdown().await;
        drop(coordinator);
        info!("engine stopped");
    }

    fn reached_max_cycles(&self) -> bool {
        self.config
            .grid
            .max_cycles
            .is_some_and(|max| self.cycles_run >= max)
    }
}
