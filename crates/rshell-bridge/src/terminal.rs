//! Local terminal control

use std::io::{self, IsTerminal};

use rshell_core::types::TerminalSize;

/// The local terminal the session is bridged to
pub trait Terminal: Send + Sync {
    /// Whether stdin is attached to a terminal at all
    fn is_tty(&self) -> bool;

    /// Current window size
    fn size(&self) -> io::Result<TerminalSize>;

    /// Whether raw mode is currently enabled
    fn is_raw_mode(&self) -> io::Result<bool>;

    /// Enable or disable raw mode
    fn set_raw_mode(&self, enabled: bool) -> io::Result<()>;
}

/// The process's controlling terminal, via crossterm
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermTerminal;

impl Terminal for CrosstermTerminal {
    fn is_tty(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn size(&self) -> io::Result<TerminalSize> {
        let (cols, rows) = crossterm::terminal::size()?;
        Ok(TerminalSize::new(cols, rows))
    }

    fn is_raw_mode(&self) -> io::Result<bool> {
        crossterm::terminal::is_raw_mode_enabled()
    }

    fn set_raw_mode(&self, enabled: bool) -> io::Result<()> {
        if enabled {
            crossterm::terminal::enable_raw_mode()
        } else {
            crossterm::terminal::disable_raw_mode()
        }
    }
}

/// Puts the terminal in raw mode and restores the previous mode on drop
pub struct RawModeGuard<'a> {
    terminal: &'a dyn Terminal,
    restore: bool,
}

impl<'a> RawModeGuard<'a> {
    /// Enter raw mode if stdin is a terminal that is not raw already
    pub fn enter(terminal: &'a dyn Terminal) -> io::Result<Self> {
        if !terminal.is_tty() {
            tracing::debug!("stdin is not a terminal, leaving mode alone");
            return Ok(Self {
                terminal,
                restore: false,
            });
        }

        let was_raw = terminal.is_raw_mode()?;
        if !was_raw {
            terminal.set_raw_mode(true)?;
        }
        Ok(Self {
            terminal,
            restore: !was_raw,
        })
    }
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        if self.restore {
            if let Err(e) = self.terminal.set_raw_mode(false) {
                tracing::error!("Failed to restore terminal mode: {}", e);
            }
        }
    }
}
