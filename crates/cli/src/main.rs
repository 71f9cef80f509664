use clap::Parser;
use config::Config;
use flume::bounded;
use gridload::{
    cli::Cli,
    logging,
    report::GridReporter,
    signals::{forward_signals, wait_for_signal},
};
use orchestrator::clock::SystemClock;
use orchestrator::fetch::HttpFetcher;
use orchestrator::{GridEngine, Services};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(
        cli.verbosity.tracing_level_filter(),
        cli.logfile.as_deref(),
    )?;

    debug!(config = ?cli);

    let mut config = match &cli.conffile {
        Some(path) => Config::load(path)?,
        _ => Config::new()?,
    };
    cli.apply(&mut config);

    if let Some(path) = &cli.dump_config {
        config.save(path)?;
        info!(?path, "configuration written");
        return Ok(());
    }

    let clock = Arc::new(SystemClock);
    let fetcher = Arc::new(HttpFetcher::new(&config.engine, clock.clone())?);
    let mut engine = GridEngine::new(
        config,
        Services {
            fetcher,
            observer: Arc::new(GridReporter),
            clock,
        },
    )?;

    let cancel = CancellationToken::new();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = bounded(8);

    let signals = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                err = wait_for_signal(&events_tx) => {
                    tracing::error!(error = ?err, "Error while waiting for signal");
                    err
                }
                res = forward_signals(events_rx, control_tx, cancel) => res,
            }
        }
    });

    let result = engine.run_until(cancel, control_rx).await;
    engine.shutdown().await;
    signals.abort();
    result?;

    Ok(())
}
