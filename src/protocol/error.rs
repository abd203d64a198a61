//! Protocol error types
//!
//! Every failure below the session layer is fatal for the operation in
//! progress. There is no resume and no automatic retry; callers restart the
//! whole command.

use std::fmt;
use std::io;

/// Protocol error type
#[derive(Debug)]
pub enum ProtocolError {
	/// I/O error from the underlying stream
	Io(io::Error),
	/// Peer closed the stream, or a read returned no data mid-message
	StreamClosed,
	/// Signature mismatch, malformed frame header or unexpected reply
	ProtocolViolation(String),
	/// HTTP upgrade answered with something other than 101
	HandshakeRejected { status_line: String },
	/// File name does not fit the fixed-width wire field
	NameTooLong { len: usize, max: usize },
	/// File size does not fit the 32-bit size field
	FileTooLarge { size: u64 },
	/// Outbound payload exceeds the 16-bit extended length
	FrameTooLarge { len: usize },
	/// Peer kept sending frames we do not understand
	TooManySkippedFrames { skipped: usize },
	/// Device answered a file request with a nonzero status
	UnexpectedStatus { status: u16 },
	/// Configuration request other than "send binary frames"
	UnsupportedIoctl { request: u32, value: u32 },
}

impl fmt::Display for ProtocolError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ProtocolError::Io(e) => write!(f, "I/O error: {}", e),
			ProtocolError::StreamClosed => write!(f, "Stream closed by peer"),
			ProtocolError::ProtocolViolation(msg) => write!(f, "Protocol violation: {}", msg),
			ProtocolError::HandshakeRejected { status_line } => {
				write!(f, "Websocket handshake rejected: {}", status_line)
			}
			ProtocolError::NameTooLong { len, max } => {
				write!(f, "File name is {} bytes, the protocol allows at most {}", len, max)
			}
			ProtocolError::FileTooLarge { size } => {
				write!(f, "File size {} does not fit the 32-bit size field", size)
			}
			ProtocolError::FrameTooLarge { len } => {
				write!(f, "Frame payload of {} bytes exceeds the 65535 byte limit", len)
			}
			ProtocolError::TooManySkippedFrames { skipped } => {
				write!(f, "Too many non-data frames ({} skipped)", skipped)
			}
			ProtocolError::UnexpectedStatus { status } => {
				write!(f, "Device reported failure status {}", status)
			}
			ProtocolError::UnsupportedIoctl { request, value } => {
				write!(f, "Unsupported ioctl request {} with value {}", request, value)
			}
		}
	}
}

impl std::error::Error for ProtocolError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			ProtocolError::Io(e) => Some(e),
			_ => None,
		}
	}
}

impl From<io::Error> for ProtocolError {
	fn from(e: io::Error) -> Self {
		if e.kind() == io::ErrorKind::UnexpectedEof {
			ProtocolError::StreamClosed
		} else {
			ProtocolError::Io(e)
		}
	}
}


// vim: ts=4
