//! Interactive session bridge
//!
//! Couples the local terminal to a remote shell: stdin flows to the shell,
//! shell output flows to stdout/stderr, and local control events become
//! window changes or forwarded signals. The terminal is restored on every
//! way out.

use async_trait::async_trait;
use russh::Disconnect;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use rshell_core::config::SessionConfig;
use rshell_core::error::SessionError;
use rshell_core::traits::InteractiveSession;
use rshell_core::types::{Endpoint, TerminalSize};

use crate::client::{authenticate, connect};
use crate::shell::{RemoteShell, RemoteSignal, ShellEvent, SshShell};
use crate::signals::{spawn_signal_listener, ControlEvent};
use crate::terminal::{CrosstermTerminal, RawModeGuard, Terminal};

/// Read buffer size for local input
const STDIN_BUFFER_SIZE: usize = 4096;

/// Run a remote shell against local I/O until it exits.
///
/// Returns `Ok` only for a zero exit status.
pub async fn pump<S, I, O, E>(
    shell: &mut S,
    terminal: &dyn Terminal,
    term: &str,
    mut stdin: I,
    mut stdout: O,
    mut stderr: E,
    mut controls: mpsc::Receiver<ControlEvent>,
) -> Result<(), SessionError>
where
    S: RemoteShell + ?Sized,
    I: AsyncRead + Unpin + Send,
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    let size = terminal.size().unwrap_or_else(|e| {
        tracing::debug!("Terminal size unavailable ({}), using default", e);
        TerminalSize::default()
    });

    shell.request_pty(term, size).await?;
    shell.request_shell().await?;

    let _raw_mode = RawModeGuard::enter(terminal)?;

    let mut buf = vec![0u8; STDIN_BUFFER_SIZE];
    let mut stdin_open = true;

    loop {
        tokio::select! {
            biased;

            Some(control) = controls.recv() => forward_control(shell, terminal, control).await,

            event = shell.next_event() => match event {
                Some(ShellEvent::Stdout(data)) => {
                    stdout.write_all(&data).await?;
                    stdout.flush().await?;
                }
                Some(ShellEvent::Stderr(data)) => {
                    stderr.write_all(&data).await?;
                    stderr.flush().await?;
                }
                Some(ShellEvent::Exit(0)) => return Ok(()),
                Some(ShellEvent::Exit(code)) => return Err(SessionError::RemoteExit { code }),
                Some(ShellEvent::ExitSignal(signal)) => {
                    return Err(SessionError::RemoteSignal { signal })
                }
                Some(ShellEvent::Eof) => tracing::trace!("Remote output finished"),
                Some(ShellEvent::Closed) | None => return Err(SessionError::TransportClosed),
            },

            read = stdin.read(&mut buf), if stdin_open => match read {
                Ok(0) => {
                    stdin_open = false;
                    shell.send_eof().await?;
                }
                Ok(n) => shell.send(&buf[..n]).await?,
                Err(e) => {
                    tracing::warn!("Local input failed: {}", e);
                    stdin_open = false;
                    shell.send_eof().await?;
                }
            },
        }
    }
}

/// Forward one local control event. Failures only cost that event.
async fn forward_control<S>(shell: &mut S, terminal: &dyn Terminal, control: ControlEvent)
where
    S: RemoteShell + ?Sized,
{
    let forwarded = match control {
        ControlEvent::Resize => match terminal.size() {
            Ok(size) => shell.resize(size).await,
            Err(e) => {
                tracing::debug!("Ignoring resize, size query failed: {}", e);
                return;
            }
        },
        ControlEvent::Interrupt => shell.signal(RemoteSignal::Interrupt).await,
        ControlEvent::Terminate => shell.signal(RemoteSignal::Terminate).await,
    };
    if let Err(e) = forwarded {
        tracing::debug!("Dropped {:?}: {}", control, e);
    }
}

/// [`InteractiveSession`] over SSH with the process's own terminal
pub struct SshBridge {
    config: SessionConfig,
}

impl SshBridge {
    /// Create a bridge for the given session parameters
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl InteractiveSession for SshBridge {
    async fn run(&self, endpoint: &Endpoint) -> Result<(), SessionError> {
        let mut handle = connect(endpoint, &self.config).await?;
        authenticate(&mut handle, &self.config).await?;
        let mut shell = SshShell::open(&handle).await?;

        let listener = CancellationToken::new();
        let controls = spawn_signal_listener(listener.clone())?;
        let _stop_listener = listener.drop_guard();

        let result = pump(
            &mut shell,
            &CrosstermTerminal,
            &self.config.term,
            tokio::io::stdin(),
            tokio::io::stdout(),
            tokio::io::stderr(),
            controls,
        )
        .await;

        if let Err(e) = handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
        {
            tracing::debug!("Disconnect failed: {}", e);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct ShellLog {
        pty: Option<(String, TerminalSize)>,
        shell_started: bool,
        sent: Vec<u8>,
        eof: bool,
        resizes: Vec<TerminalSize>,
        signals: Vec<RemoteSignal>,
    }

    struct FakeShell {
        events: mpsc::UnboundedReceiver<ShellEvent>,
        log: Arc<Mutex<ShellLog>>,
        activity: mpsc::UnboundedSender<()>,
        /// Refuse window changes and signals after recording them
        reject_controls: bool,
    }

    impl FakeShell {
        fn control_reply(&self, what: &str) -> Result<(), SessionError> {
            let _ = self.activity.send(());
            if self.reject_controls {
                Err(SessionError::Protocol(format!("{} rejected", what)))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RemoteShell for FakeShell {
        async fn request_pty(
            &mut self,
            term: &str,
            size: TerminalSize,
        ) -> Result<(), SessionError> {
            self.log.lock().unwrap().pty = Some((term.to_string(), size));
            Ok(())
        }

        async fn request_shell(&mut self) -> Result<(), SessionError> {
            self.log.lock().unwrap().shell_started = true;
            Ok(())
        }

        async fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
            self.log.lock().unwrap().sent.extend_from_slice(data);
            let _ = self.activity.send(());
            Ok(())
        }

        async fn send_eof(&mut self) -> Result<(), SessionError> {
            self.log.lock().unwrap().eof = true;
            let _ = self.activity.send(());
            Ok(())
        }

        async fn resize(&mut self, size: TerminalSize) -> Result<(), SessionError> {
            self.log.lock().unwrap().resizes.push(size);
            self.control_reply("window-change")
        }

        async fn signal(&mut self, signal: RemoteSignal) -> Result<(), SessionError> {
            self.log.lock().unwrap().signals.push(signal);
            self.control_reply("signal")
        }

        async fn next_event(&mut self) -> Option<ShellEvent> {
            self.events.recv().await
        }
    }

    struct FakeTerminal {
        size: Mutex<Option<TerminalSize>>,
        raw: AtomicBool,
    }

    impl FakeTerminal {
        fn new(size: Option<TerminalSize>) -> Self {
            Self {
                size: Mutex::new(size),
                raw: AtomicBool::new(false),
            }
        }

        fn is_raw(&self) -> bool {
            self.raw.load(Ordering::SeqCst)
        }
    }

    impl Terminal for FakeTerminal {
        fn is_tty(&self) -> bool {
            true
        }

        fn size(&self) -> io::Result<TerminalSize> {
            self.size
                .lock()
                .unwrap()
                .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "no size"))
        }

        fn is_raw_mode(&self) -> io::Result<bool> {
            Ok(self.is_raw())
        }

        fn set_raw_mode(&self, enabled: bool) -> io::Result<()> {
            self.raw.store(enabled, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Harness {
        shell: FakeShell,
        events: mpsc::UnboundedSender<ShellEvent>,
        log: Arc<Mutex<ShellLog>>,
        activity: mpsc::UnboundedReceiver<()>,
        controls_tx: mpsc::Sender<ControlEvent>,
        controls_rx: mpsc::Receiver<ControlEvent>,
    }

    fn harness() -> Harness {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (activity_tx, activity_rx) = mpsc::unbounded_channel();
        let (controls_tx, controls_rx) = mpsc::channel(8);
        let log = Arc::new(Mutex::new(ShellLog::default()));
        Harness {
            shell: FakeShell {
                events: events_rx,
                log: log.clone(),
                activity: activity_tx,
                reject_controls: false,
            },
            events: events_tx,
            log,
            activity: activity_rx,
            controls_tx,
            controls_rx,
        }
    }

    #[tokio::test]
    async fn test_clean_exit_restores_terminal() {
        let Harness {
            mut shell,
            events,
            log,
            controls_rx,
            ..
        } = harness();
        let terminal = FakeTerminal::new(Some(TerminalSize::new(132, 50)));
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        events.send(ShellEvent::Stdout(b"hello\r\n".to_vec())).unwrap();
        events.send(ShellEvent::Stderr(b"warn\r\n".to_vec())).unwrap();
        events.send(ShellEvent::Eof).unwrap();
        events.send(ShellEvent::Exit(0)).unwrap();

        pump(
            &mut shell,
            &terminal,
            "xterm-256color",
            stdin,
            &mut stdout,
            &mut stderr,
            controls_rx,
        )
        .await
        .unwrap();

        assert_eq!(stdout, b"hello\r\n");
        assert_eq!(stderr, b"warn\r\n");
        assert!(!terminal.is_raw());

        let log = log.lock().unwrap();
        assert_eq!(
            log.pty,
            Some(("xterm-256color".to_string(), TerminalSize::new(132, 50)))
        );
        assert!(log.shell_started);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported() {
        let Harness {
            mut shell,
            events,
            controls_rx,
            ..
        } = harness();
        let terminal = FakeTerminal::new(None);
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        events.send(ShellEvent::Exit(2)).unwrap();
        let err = pump(
            &mut shell,
            &terminal,
            "xterm",
            stdin,
            tokio::io::sink(),
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::RemoteExit { code: 2 }));
        assert!(!terminal.is_raw());
    }

    #[tokio::test]
    async fn test_missing_size_uses_default() {
        let Harness {
            mut shell,
            events,
            log,
            controls_rx,
            ..
        } = harness();
        let terminal = FakeTerminal::new(None);
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        events.send(ShellEvent::Exit(0)).unwrap();
        pump(
            &mut shell,
            &terminal,
            "xterm",
            stdin,
            tokio::io::sink(),
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap();

        let pty = log.lock().unwrap().pty.clone().unwrap();
        assert_eq!(pty.1, TerminalSize::new(80, 24));
    }

    #[tokio::test]
    async fn test_transport_drop_restores_terminal() {
        let Harness {
            mut shell,
            events,
            controls_rx,
            ..
        } = harness();
        let terminal = FakeTerminal::new(Some(TerminalSize::default()));
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        events.send(ShellEvent::Stdout(b"partial".to_vec())).unwrap();
        drop(events);

        let err = pump(
            &mut shell,
            &terminal,
            "xterm",
            stdin,
            tokio::io::sink(),
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::TransportClosed));
        assert!(!terminal.is_raw());
    }

    #[tokio::test]
    async fn test_input_and_eof_are_forwarded() {
        let Harness {
            mut shell,
            events,
            log,
            mut activity,
            controls_rx,
            ..
        } = harness();
        let terminal = FakeTerminal::new(Some(TerminalSize::default()));
        let (mut stdin_writer, stdin) = tokio::io::duplex(64);

        let driver = tokio::spawn(async move {
            stdin_writer.write_all(b"ls -la\r").await.unwrap();
            activity.recv().await.unwrap();
            drop(stdin_writer);
            activity.recv().await.unwrap();
            events.send(ShellEvent::Exit(0)).unwrap();
        });

        pump(
            &mut shell,
            &terminal,
            "xterm",
            stdin,
            tokio::io::sink(),
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap();
        driver.await.unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.sent, b"ls -la\r");
        assert!(log.eof);
    }

    #[tokio::test]
    async fn test_resize_forwards_new_dimensions() {
        let Harness {
            mut shell,
            events,
            log,
            mut activity,
            controls_tx,
            controls_rx,
        } = harness();
        let terminal = Arc::new(FakeTerminal::new(Some(TerminalSize::new(80, 24))));
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        let resized = terminal.clone();
        let driver = tokio::spawn(async move {
            *resized.size.lock().unwrap() = Some(TerminalSize::new(120, 40));
            controls_tx.send(ControlEvent::Resize).await.unwrap();
            activity.recv().await.unwrap();
            events.send(ShellEvent::Exit(0)).unwrap();
        });

        pump(
            &mut shell,
            terminal.as_ref(),
            "xterm",
            stdin,
            tokio::io::sink(),
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap();
        driver.await.unwrap();

        assert_eq!(
            log.lock().unwrap().resizes,
            vec![TerminalSize::new(120, 40)]
        );
    }

    #[tokio::test]
    async fn test_failed_size_query_sends_nothing() {
        let Harness {
            mut shell,
            events,
            log,
            controls_tx,
            controls_rx,
            ..
        } = harness();
        let terminal = FakeTerminal::new(None);
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        controls_tx.send(ControlEvent::Resize).await.unwrap();
        events.send(ShellEvent::Exit(0)).unwrap();

        pump(
            &mut shell,
            &terminal,
            "xterm",
            stdin,
            tokio::io::sink(),
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap();

        assert!(log.lock().unwrap().resizes.is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_is_forwarded_and_terminal_restored() {
        let Harness {
            mut shell,
            events,
            log,
            controls_tx,
            controls_rx,
            ..
        } = harness();
        let terminal = FakeTerminal::new(Some(TerminalSize::default()));
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        controls_tx.send(ControlEvent::Interrupt).await.unwrap();
        controls_tx.send(ControlEvent::Terminate).await.unwrap();
        events.send(ShellEvent::ExitSignal("INT".to_string())).unwrap();

        let err = pump(
            &mut shell,
            &terminal,
            "xterm",
            stdin,
            tokio::io::sink(),
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SessionError::RemoteSignal { ref signal } if signal == "INT"));
        assert_eq!(
            log.lock().unwrap().signals,
            vec![RemoteSignal::Interrupt, RemoteSignal::Terminate]
        );
        assert!(!terminal.is_raw());
    }

    #[tokio::test]
    async fn test_refused_controls_do_not_end_session() {
        let Harness {
            mut shell,
            events,
            log,
            controls_tx,
            controls_rx,
            ..
        } = harness();
        shell.reject_controls = true;
        let terminal = FakeTerminal::new(Some(TerminalSize::new(100, 30)));
        let (_stdin_writer, stdin) = tokio::io::duplex(64);

        controls_tx.send(ControlEvent::Resize).await.unwrap();
        controls_tx.send(ControlEvent::Interrupt).await.unwrap();
        controls_tx.send(ControlEvent::Terminate).await.unwrap();
        events.send(ShellEvent::Stdout(b"still here\r\n".to_vec())).unwrap();
        events.send(ShellEvent::Exit(0)).unwrap();

        let mut stdout = Vec::new();
        pump(
            &mut shell,
            &terminal,
            "xterm",
            stdin,
            &mut stdout,
            tokio::io::sink(),
            controls_rx,
        )
        .await
        .unwrap();

        assert_eq!(stdout, b"still here\r\n");
        let log = log.lock().unwrap();
        assert_eq!(log.resizes, vec![TerminalSize::new(100, 30)]);
        assert_eq!(
            log.signals,
            vec![RemoteSignal::Interrupt, RemoteSignal::Terminate]
        );
        assert!(!terminal.is_raw());
    }
}
