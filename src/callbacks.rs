//! Callback traits for transfer progress reporting

use std::fmt;

/// Direction of a file transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
	/// Local file to device
	Put,
	/// Device file to local disk
	Get,
}

impl fmt::Display for TransferDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransferDirection::Put => write!(f, "put"),
			TransferDirection::Get => write!(f, "get"),
		}
	}
}

/// Events emitted while a transfer runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
	/// Request accepted by the device
	Started {
		direction: TransferDirection,
		remote_path: String,
		/// Known for PUT only; GET streams have no announced size
		total_bytes: Option<u64>,
	},

	/// Cumulative byte count after each chunk
	Progress { direction: TransferDirection, bytes_transferred: u64, total_bytes: Option<u64> },

	/// Final status received
	Finished { direction: TransferDirection, bytes_transferred: u64 },
}

/// Callback for transfer progress
pub trait ProgressCallback: Send + Sync {
	fn on_event(&self, event: TransferEvent);
}

/// Default progress callback that does nothing
pub struct NoProgressCallback;

impl ProgressCallback for NoProgressCallback {
	fn on_event(&self, _event: TransferEvent) {}
}

// vim: ts=4
