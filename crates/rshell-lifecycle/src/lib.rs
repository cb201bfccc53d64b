//! rshell-lifecycle: Remote task lifecycle
//!
//! This crate launches a task from a template, waits for it to run, checks
//! its health, resolves where it can be reached and hands the endpoint to
//! an interactive session. Every launched task is stopped on the way out.

pub mod address;
pub mod backoff;
pub mod health;
pub mod launch;
pub mod lifecycle;
pub mod state;
pub mod teardown;
pub mod wait;

pub use lifecycle::TaskLifecycle;
pub use state::LifecycleState;
pub use teardown::{TeardownObligation, TEARDOWN_REASON};
pub use wait::WaitOutcome;
