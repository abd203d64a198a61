//! Interactive REPL over a WebREPL session
//!
//! - `mode`: NORMAL / RAW / PASTE and the control bytes switching them
//! - `echo`: pending-echo suppression
//! - `state`: the session state machine fed by both directions
//! - `editor`: local line editing on a non-canonical terminal
//! - `controller`: the async loop tying keyboard, device and signals together

pub mod controller;
pub mod echo;
pub mod editor;
pub mod mode;
pub mod state;

pub use controller::{run_interactive, run_loop, Flow, RemoteEvent, ReplController};
pub use echo::EchoTracker;
pub use editor::{EditorEvent, LineEditor};
pub use mode::{remap_control_line, ReplMode, CTRL_A, CTRL_B, CTRL_C, CTRL_D, CTRL_E};
pub use state::{LocalAction, ReplState};

// vim: ts=4
