use crate::error::Error;
use flume::{Receiver, Sender};
use orchestrator::ControlEvent;
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Indefinitely listens to signals and sends signal events to the provided channel.
pub async fn wait_for_signal(signal_event: &Sender<SignalEvent>) -> Result<(), Error> {
    let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(Error::SignalHandler)?;
    let mut sigusr2 = signal(SignalKind::user_defined2()).map_err(Error::SignalHandler)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(Error::SignalHandler)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(Error::SignalHandler)?;

    loop {
        tokio::select! {
            _ = sigusr1.recv() => {
                signal_event.send_async(SignalEvent::SigUSR1).await?;
            }
            _ = sigusr2.recv() => {
                signal_event.send_async(SignalEvent::SigUSR2).await?;
            }
            _ = sigint.recv() => {
                signal_event.send_async(SignalEvent::Interrupt).await?;
            }
            _ = sigterm.recv() => {
                signal_event.send_async(SignalEvent::Interrupt).await?;
            }
        }
    }
}

/// Turn signal events into engine control events until the engine goes away
/// or an interrupt arrives, which cancels `cancel`.
pub async fn forward_signals(
    events: Receiver<SignalEvent>,
    control: UnboundedSender<ControlEvent>,
    cancel: CancellationToken,
) -> Result<(), Error> {
    while let Ok(event) = events.recv_async().await {
        debug!(?event, "Received signal event");
        let Some(control_event) = event.control() else {
            cancel.cancel();
            break;
        };
        control
            .send(control_event)
            .map_err(|err| Error::SendControl(err.0))?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    /// Reload the grid.
    SigUSR1,
    /// Dump the current metrics.
    SigUSR2,
    /// SIGINT or SIGTERM.
    Interrupt,
}

impl SignalEvent {
    /// The engine event this signal maps to; `None` means shut down.
    pub fn control(self) -> Option<ControlEvent> {
        match self {
            Self::SigUSR1 => Some(ControlEvent::Reload),
            Self::SigUSR2 => Some(ControlEvent::DumpInfo),
            Self::Interrupt => None,
        }
    }
}
