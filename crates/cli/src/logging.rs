use crate::error::Error;
use std::fs;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;

/// Keeps the log file writer alive. Dropping it flushes the file.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber, writing to `logfile` when given and to
/// stderr otherwise.
pub fn init(level: LevelFilter, logfile: Option<&Path>) -> Result<LoggingGuard, Error> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_level(true)
        .with_file(true)
        .with_line_number(true);

    let Some(path) = logfile.filter(|path| !path.as_os_str().is_empty()) else {
        builder.with_writer(std::io::stderr).init();
        return Ok(LoggingGuard { _file_guard: None });
    };

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(Error::LogFile)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    builder.with_ansi(false).with_writer(writer).init();

    Ok(LoggingGuard {
        _file_guard: Some(guard),
    })
}
