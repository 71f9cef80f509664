#![forbid(unsafe_code)]

use crate::error::Error;
use config::NetLogConfig;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetLogEvent {
    CycleStarted {
        cycle: u64,
        effective: usize,
        total: usize,
    },
    RequestSucceeded {
        cycle: u64,
        index: usize,
        bytes: usize,
        latency: Duration,
        status: u16,
        protocol: String,
    },
    RequestFailed {
        cycle: u64,
        index: usize,
        error: String,
    },
    CycleComplete {
        cycle: u64,
        average: Duration,
    },
}

impl fmt::Display for NetLogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleStarted {
                cycle,
                effective,
                total,
            } => write!(
                f,
                "cycle_started cycle={cycle} effective={effective} total={total}"
            ),
            Self::RequestSucceeded {
                cycle,
                index,
                bytes,
                latency,
                status,
                protocol,
            } => write!(
                f,
                "request_succeeded cycle={cycle} index={index} bytes={bytes} latency_ns={} status={status} protocol={protocol}",
                latency.as_nanos()
            ),
            Self::RequestFailed {
                cycle,
                index,
                error,
            } => write!(f, "request_failed cycle={cycle} index={index} error={error:?}"),
            Self::CycleComplete { cycle, average } => write!(
                f,
                "cycle_complete cycle={cycle} average_ns={}",
                average.as_nanos()
            ),
        }
    }
}

/// Append-only log of transport events.
///
/// Lines are handed to a background writer. Dropping the log flushes the
/// writer and closes the file, so the log is complete however the owner
/// exits, including when a panic unwinds through it.
pub struct NetLog {
    writer: NonBlocking,
    path: PathBuf,
    started: Instant,
    _guard: WorkerGuard,
}

impl NetLog {
    /// Truncate the configured file and start writing to it.
    pub fn start(config: &NetLogConfig) -> Result<Self, Error> {
        if config.file.is_empty() {
            return Err(Error::InvalidPath(config.dir.clone()));
        }
        let path = config.path();
        fs::create_dir_all(&config.dir)?;
        fs::write(&path, "")?;

        let appender = tracing_appender::rolling::never(&config.dir, &config.file);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        info!(?path, "net log started");

        Ok(Self {
            writer,
            path,
            started: Instant::now(),
            _guard: guard,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, event: &NetLogEvent) {
        let line = format!("+{}ms {event}\n", self.started.elapsed().as_millis());
        let mut writer = self.writer.clone();
        if let Err(err) = writer.write_all(line.as_bytes()) {
            warn!(%err, "failed to write net log entry");
        }
    }
}

impl Drop for NetLog {
    fn drop(&mut self) {
        info!(path = ?self.path, "net log stopped");
    }
}
