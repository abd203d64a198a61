//! Error types for WebREPL operations

use std::error::Error;
use std::fmt;
use std::io;

use crate::protocol::ProtocolError;
use crate::utils::signals::Termination;

/// Result type for top-level operations
pub type Result<T> = std::result::Result<T, WebReplError>;

/// Main error type for client commands
#[derive(Debug)]
pub enum WebReplError {
	/// Could not reach the device
	Connection(ConnectionError),

	/// Wire protocol failure (nested)
	Protocol(ProtocolError),

	/// Local I/O error
	Io(io::Error),

	/// Invalid configuration
	InvalidConfig { message: String },

	/// Command-line target could not be understood
	InvalidTarget { message: String },

	/// A signal stopped the command before it finished
	Interrupted(Termination),
}

impl fmt::Display for WebReplError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WebReplError::Connection(e) => write!(f, "Connection error: {}", e),
			WebReplError::Protocol(e) => write!(f, "{}", e),
			WebReplError::Io(e) => write!(f, "I/O error: {}", e),
			WebReplError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			WebReplError::InvalidTarget { message } => write!(f, "{}", message),
			WebReplError::Interrupted(signal) => write!(f, "Interrupted by {}", signal),
		}
	}
}

impl Error for WebReplError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			WebReplError::Connection(e) => Some(e),
			WebReplError::Protocol(e) => Some(e),
			WebReplError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for WebReplError {
	fn from(e: io::Error) -> Self {
		WebReplError::Io(e)
	}
}

impl From<ProtocolError> for WebReplError {
	fn from(e: ProtocolError) -> Self {
		WebReplError::Protocol(e)
	}
}

impl From<ConnectionError> for WebReplError {
	fn from(e: ConnectionError) -> Self {
		WebReplError::Connection(e)
	}
}

/// Connection-specific errors
#[derive(Debug)]
pub enum ConnectionError {
	/// TCP connect failed outright
	ConnectFailed { address: String, source: io::Error },

	/// Every connect attempt timed out
	Timeout { address: String, attempts: u32 },
}

impl fmt::Display for ConnectionError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConnectionError::ConnectFailed { address, source } => {
				write!(f, "Failed to connect to {}: {}", address, source)
			}
			ConnectionError::Timeout { address, attempts } => {
				write!(f, "Could not connect to {} after {} attempts", address, attempts)
			}
		}
	}
}

impl Error for ConnectionError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			ConnectionError::ConnectFailed { source, .. } => Some(source),
			ConnectionError::Timeout { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_protocol_error_converts() {
		let err: WebReplError = ProtocolError::StreamClosed.into();
		assert!(matches!(err, WebReplError::Protocol(ProtocolError::StreamClosed)));
		assert!(err.source().is_some());
	}

	#[test]
	fn test_interrupted_display() {
		let err = WebReplError::Interrupted(Termination::Interrupt);
		assert_eq!(err.to_string(), "Interrupted by SIGINT");
	}

	#[test]
	fn test_timeout_display() {
		let err = ConnectionError::Timeout { address: "192.168.4.1:8266".to_string(), attempts: 5 };
		assert_eq!(err.to_string(), "Could not connect to 192.168.4.1:8266 after 5 attempts");
	}
}

// vim: ts=4
