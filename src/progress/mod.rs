//! Progress display callback for CLI transfers
//!
//! Renders a single, rewritten status line on stderr.

pub mod constants;

use std::io::Write;
use std::sync::Mutex;
use std::time::Instant;
use tracing::info;

use crate::callbacks::{ProgressCallback, TransferDirection, TransferEvent};

/// Progress display constants
pub use constants::*;

/// Format the status line for a byte count
pub fn progress_line(direction: TransferDirection, bytes: u64, total: Option<u64>) -> String {
	match (direction, total) {
		(TransferDirection::Put, Some(total)) => format!("Sent {} of {} bytes", bytes, total),
		(TransferDirection::Put, None) => format!("Sent {} bytes", bytes),
		(TransferDirection::Get, _) => format!("Received {} bytes", bytes),
	}
}

/// CLI progress callback
pub struct CliProgressCallback {
	last_update: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
	pub fn new() -> Self {
		Self { last_update: Mutex::new(None) }
	}

	/// Whether enough time passed since the last redraw
	fn should_redraw(&self) -> bool {
		let mut last = self.last_update.lock().unwrap_or_else(|e| e.into_inner());
		match *last {
			Some(at) if at.elapsed().as_millis() < UPDATE_THROTTLE_MS => false,
			_ => {
				*last = Some(Instant::now());
				true
			}
		}
	}
}

impl Default for CliProgressCallback {
	fn default() -> Self {
		Self::new()
	}
}

impl ProgressCallback for CliProgressCallback {
	fn on_event(&self, event: TransferEvent) {
		match event {
			TransferEvent::Started { direction, remote_path, total_bytes } => {
				info!("→ {} {} ({:?} bytes)", direction, remote_path, total_bytes);
				let _ = write!(std::io::stderr(), "\r{}", progress_line(direction, 0, total_bytes));
				let _ = std::io::stderr().flush();
			}
			TransferEvent::Progress { direction, bytes_transferred, total_bytes } => {
				if !self.should_redraw() {
					return;
				}
				let _ = write!(
					std::io::stderr(),
					"\r{}",
					progress_line(direction, bytes_transferred, total_bytes)
				);
				let _ = std::io::stderr().flush();
			}
			TransferEvent::Finished { direction, bytes_transferred } => {
				let total = if direction == TransferDirection::Put { Some(bytes_transferred) } else { None };
				let _ = writeln!(
					std::io::stderr(),
					"\r{}",
					progress_line(direction, bytes_transferred, total)
				);
			}
		}
	}
}


// vim: ts=4
