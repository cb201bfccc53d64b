//! rshell-bridge: Interactive SSH session bridge
//!
//! Connects to a remote shell over SSH, requests a PTY sized to the local
//! terminal and relays input, output, window changes and signals until the
//! remote shell exits.

pub mod bridge;
pub mod client;
pub mod shell;
pub mod signals;
pub mod terminal;

pub use bridge::{pump, SshBridge};
pub use shell::{RemoteShell, RemoteSignal, ShellEvent, SshShell};
pub use signals::ControlEvent;
pub use terminal::{CrosstermTerminal, RawModeGuard, Terminal};
