//! Local control events for the interactive phase
//!
//! Window-size changes, interrupts and terminate requests are turned into
//! [`ControlEvent`]s on a bounded channel. Delivery never blocks the
//! listener: when the channel is full the event is dropped.

use std::io;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

/// Capacity of the control event channel
pub const CONTROL_CHANNEL_CAPACITY: usize = 32;

/// A local event the bridge must react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// The local window changed size
    Resize,
    /// Interrupt request (SIGINT)
    Interrupt,
    /// Terminate request (SIGTERM)
    Terminate,
}

/// Queue an event without waiting.
///
/// Returns false once the receiving side is gone.
pub fn deliver(tx: &mpsc::Sender<ControlEvent>, event: ControlEvent) -> bool {
    match tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            tracing::debug!("Control channel full, dropping {:?}", event);
            true
        }
        Err(TrySendError::Closed(_)) => false,
    }
}

/// Listen for control signals until `cancel` fires or the receiver is dropped
#[cfg(unix)]
pub fn spawn_signal_listener(
    cancel: CancellationToken,
) -> io::Result<mpsc::Receiver<ControlEvent>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut resize = signal(SignalKind::window_change())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    let (tx, rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                Some(()) = resize.recv() => ControlEvent::Resize,
                Some(()) = interrupt.recv() => ControlEvent::Interrupt,
                Some(()) = terminate.recv() => ControlEvent::Terminate,
                else => break,
            };
            if !deliver(&tx, event) {
                break;
            }
        }
        tracing::trace!("Signal listener stopped");
    });

    Ok(rx)
}

/// Listen for control signals until `cancel` fires or the receiver is dropped
#[cfg(not(unix))]
pub fn spawn_signal_listener(
    cancel: CancellationToken,
) -> io::Result<mpsc::Receiver<ControlEvent>> {
    let (tx, rx) = mpsc::channel(CONTROL_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = tokio::signal::ctrl_c() => {
                    if result.is_err() || !deliver(&tx, ControlEvent::Interrupt) {
                        break;
                    }
                }
            }
        }
    });
    Ok(rx)
}
