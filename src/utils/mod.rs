//! Utility modules for terminal and process handling

pub mod signals;
pub mod terminal;

pub use signals::{forward_interrupts, wait_for_termination, Termination};
pub use terminal::{read_password, TerminalGuard};

// vim: ts=4
