//! Websocket-like capability set used by the session layer
//!
//! The session, file transfer and login code depend only on this trait.
//! `FrameCodec` is the one implementation that talks to a device; tests
//! substitute scripted transports.

use async_trait::async_trait;

use super::error::ProtocolError;

/// Result type for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// ioctl request selecting the opcode used for outgoing data
pub const IOCTL_SET_DATA_OPCODE: u32 = 9;

/// ioctl value selecting binary frames
pub const IOCTL_DATA_OPCODE_BINARY: u32 = 2;

#[async_trait]
pub trait WebSocketTransport: Send {
	/// Send `data` as one frame, text or binary
	async fn write(&mut self, data: &[u8], text: bool) -> ProtocolResult<()>;

	/// Read exactly `size` bytes of frame payload
	///
	/// Text frames count as data only when `allow_text` is set; all other
	/// frames are skipped.
	async fn read(&mut self, size: usize, allow_text: bool) -> ProtocolResult<Vec<u8>>;

	/// Link configuration; only "send binary frames" is understood
	fn ioctl(&mut self, request: u32, value: u32) -> ProtocolResult<()>;

	/// Shut the outbound direction down
	async fn close(&mut self) -> ProtocolResult<()>;
}


// vim: ts=4
