use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use config::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// gridload: concurrent image grid loader
///
/// Loads a grid of remote resources in cycles. Every cycle fetches one more
/// resource than the last, so repeated loads show how the transport warms up.
/// The average latency is reported once all fetches of a cycle succeed.
///
/// Send SIGUSR1 to reload, SIGUSR2 to dump the current metrics.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, value_parser = validate_file)]
    pub conffile: Option<PathBuf>,

    /// Path to log file.
    ///
    /// Empty string means log to stderr.
    #[arg(short, long)]
    pub logfile: Option<PathBuf>,

    /// Resource to fetch. Repeat to build the grid; replaces the configured list.
    #[arg(short = 'r', long = "resource")]
    pub resources: Vec<String>,

    /// Stop after this many cycles.
    #[arg(short = 'n', long)]
    pub cycles: Option<u64>,

    /// Seconds between automatic reloads. Zero reloads on SIGUSR1 only.
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Number of concurrent fetches.
    #[arg(short, long, value_parser = validate_workers)]
    pub workers: Option<usize>,

    /// Write a transport event log into this directory.
    #[arg(long)]
    pub netlog: Option<PathBuf>,

    /// Write the effective configuration to this file and exit.
    #[arg(long)]
    pub dump_config: Option<PathBuf>,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

impl Cli {
    /// Override configuration values given on the command line.
    pub fn apply(&self, config: &mut Config) {
        if !self.resources.is_empty() {
            config.grid.resources = self.resources.clone();
        }
        if let Some(cycles) = self.cycles {
            config.grid.max_cycles = Some(cycles);
        }
        if let Some(interval) = self.interval {
            config.grid.reload_interval = Duration::from_secs(interval);
        }
        if let Some(workers) = self.workers {
            config.executor.workers = workers;
        }
        if let Some(dir) = &self.netlog {
            config.netlog.enabled = true;
            config.netlog.dir = dir.clone();
        }
    }
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.exists() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

/// Validate worker count
#[inline(always)]
fn validate_workers(workers: &str) -> Result<usize, String> {
    let workers: usize = workers
        .parse()
        .map_err(|_| format!("`{workers}` is not a valid worker count"))?;
    if (1..=256).contains(&workers) {
        Ok(workers)
    } else {
        Err("Worker count must be between 1 and 256".to_string())
    }
}
