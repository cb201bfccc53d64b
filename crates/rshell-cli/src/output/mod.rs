//! User-facing status lines
//!
//! Everything here goes to stderr; stdout belongs to the remote shell.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use rshell_core::types::TaskDescriptor;
use rshell_lifecycle::LifecycleState;

fn print_status(color: Color, symbol: &str, msg: &str) {
    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(color),
        Print(symbol),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    print_status(Color::Green, "✓ ", msg);
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    print_status(Color::Red, "✗ ", msg);
}

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
    print_status(Color::Yellow, "⚠ ", msg);
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    print_status(Color::Cyan, "ℹ ", msg);
}

/// One-line summary of what is about to be launched
pub fn format_descriptor(descriptor: &TaskDescriptor) -> String {
    let placement = if descriptor.network.assign_public_ip {
        "public"
    } else {
        "private"
    };
    format!(
        "{} (container {}, port {}, cluster {}, {})",
        descriptor.template_id,
        descriptor.container_name,
        descriptor.port,
        descriptor.cluster,
        placement
    )
}

/// Progress line shown when the lifecycle enters `state`
pub fn progress_message(state: LifecycleState) -> Option<&'static str> {
    match state {
        LifecycleState::AwaitingRunning => Some("Waiting for the task to start"),
        LifecycleState::AddressResolving => Some("Looking up the task address"),
        LifecycleState::Ready => Some("Connecting to the remote shell"),
        LifecycleState::Terminating => Some("Stopping the task"),
        _ => None,
    }
}
