use crate::signals::SignalEvent;
use flume::SendError;
use orchestrator::ControlEvent;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] io::Error),

    #[error("Failed to send signal event: {0}")]
    SendSignal(#[from] SendError<SignalEvent>),

    #[error("Engine stopped accepting control events: {0:?}")]
    SendControl(ControlEvent),

    #[error("Failed to open log file: {0}")]
    LogFile(#[source] io::Error),
}
