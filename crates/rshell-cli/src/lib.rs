//! rshell: command-line front end
//!
//! Flag handling, session parameter assembly, the confirmation prompt and
//! user-facing output for the `rshell` binary.

pub mod output;
pub mod prompt;
pub mod session;
