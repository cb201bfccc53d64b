//! Remote shell channel

use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg, Pty, Sig};

use rshell_core::error::SessionError;
use rshell_core::types::TerminalSize;

use crate::client::ClientHandler;

/// Line speed advertised for the remote PTY
const PTY_SPEED: u32 = 14400;

/// Extended data stream carrying stderr
const STDERR_STREAM: u32 = 1;

/// Signals forwarded to the remote process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSignal {
    Interrupt,
    Terminate,
}

/// Something the remote shell sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// Standard output bytes
    Stdout(Vec<u8>),
    /// Standard error bytes
    Stderr(Vec<u8>),
    /// The remote process exited with a status
    Exit(u32),
    /// The remote process was killed by a signal
    ExitSignal(String),
    /// The remote side will send no more data
    Eof,
    /// The channel was closed
    Closed,
}

/// An interactive shell running on the remote side
#[async_trait]
pub trait RemoteShell: Send {
    /// Request a PTY of the given type and size
    async fn request_pty(&mut self, term: &str, size: TerminalSize) -> Result<(), SessionError>;

    /// Start the login shell
    async fn request_shell(&mut self) -> Result<(), SessionError>;

    /// Send input bytes
    async fn send(&mut self, data: &[u8]) -> Result<(), SessionError>;

    /// Signal end of input
    async fn send_eof(&mut self) -> Result<(), SessionError>;

    /// Report a new window size
    async fn resize(&mut self, size: TerminalSize) -> Result<(), SessionError>;

    /// Forward a signal to the remote process
    async fn signal(&mut self, signal: RemoteSignal) -> Result<(), SessionError>;

    /// Wait for the next event; `None` once the transport is gone
    async fn next_event(&mut self) -> Option<ShellEvent>;
}

/// A shell on an SSH session channel
pub struct SshShell {
    channel: Channel<Msg>,
}

impl SshShell {
    /// Open a session channel on an authenticated connection
    pub async fn open(handle: &Handle<ClientHandler>) -> Result<Self, SessionError> {
        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::Protocol(format!("Failed to open session channel: {}", e)))?;
        Ok(Self { channel })
    }

    /// Wait for the reply to a request sent with `want_reply`
    async fn await_reply(&mut self) -> Result<(), String> {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Success) => return Ok(()),
                Some(ChannelMsg::Failure) => return Err("request refused by server".to_string()),
                Some(ChannelMsg::Close) | None => return Err("channel closed".to_string()),
                Some(other) => tracing::trace!("Ignoring {:?} while awaiting reply", other),
            }
        }
    }
}

fn protocol(e: russh::Error) -> SessionError {
    SessionError::Protocol(e.to_string())
}

fn signal_name(signal: &Sig) -> String {
    match signal {
        Sig::Custom(name) => name.clone(),
        standard => format!("{:?}", standard),
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn request_pty(&mut self, term: &str, size: TerminalSize) -> Result<(), SessionError> {
        let modes = [
            (Pty::ECHO, 0),
            (Pty::TTY_OP_ISPEED, PTY_SPEED),
            (Pty::TTY_OP_OSPEED, PTY_SPEED),
        ];
        self.channel
            .request_pty(true, term, size.cols as u32, size.rows as u32, 0, 0, &modes)
            .await
            .map_err(|e| SessionError::Pty(e.to_string()))?;
        self.await_reply().await.map_err(SessionError::Pty)
    }

    async fn request_shell(&mut self) -> Result<(), SessionError> {
        self.channel
            .request_shell(true)
            .await
            .map_err(|e| SessionError::Shell(e.to_string()))?;
        self.await_reply().await.map_err(SessionError::Shell)
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.channel.data(data).await.map_err(protocol)
    }

    async fn send_eof(&mut self) -> Result<(), SessionError> {
        self.channel.eof().await.map_err(protocol)
    }

    async fn resize(&mut self, size: TerminalSize) -> Result<(), SessionError> {
        self.channel
            .window_change(size.cols as u32, size.rows as u32, 0, 0)
            .await
            .map_err(protocol)
    }

    async fn signal(&mut self, signal: RemoteSignal) -> Result<(), SessionError> {
        let sig = match signal {
            RemoteSignal::Interrupt => Sig::INT,
            RemoteSignal::Terminate => Sig::TERM,
        };
        self.channel.signal(sig).await.map_err(protocol)
    }

    async fn next_event(&mut self) -> Option<ShellEvent> {
        loop {
            let event = match self.channel.wait().await? {
                ChannelMsg::Data { data } => ShellEvent::Stdout(data.to_vec()),
                ChannelMsg::ExtendedData { data, ext } if ext == STDERR_STREAM => {
                    ShellEvent::Stderr(data.to_vec())
                }
                ChannelMsg::ExitStatus { exit_status } => ShellEvent::Exit(exit_status),
                ChannelMsg::ExitSignal { signal_name: sig, .. } => {
                    ShellEvent::ExitSignal(signal_name(&sig))
                }
                ChannelMsg::Eof => ShellEvent::Eof,
                ChannelMsg::Close => ShellEvent::Closed,
                other => {
                    tracing::trace!("Ignoring channel message {:?}", other);
                    continue;
                }
            };
            return Some(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(&Sig::KILL), "KILL");
        assert_eq!(signal_name(&Sig::Custom("WINCH".to_string())), "WINCH");
    }
}
