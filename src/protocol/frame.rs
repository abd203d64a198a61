//! Reduced websocket framing used by the WebREPL server
//!
//! Frames are never fragmented and never masked. A frame header is the byte
//! `0x80 | opcode` followed by a length byte; lengths of 126 and above are
//! sent as the literal 126 plus a big-endian u16. Anything that is not a
//! text or binary frame is drained and dropped.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use super::error::ProtocolError;
use super::traits::ProtocolResult;

/// Final-fragment bit, always set on frames we send and accept
pub const FIN: u8 = 0x80;

pub const OPCODE_TEXT: u8 = 0x01;
pub const OPCODE_BINARY: u8 = 0x02;

/// Length byte announcing a 16-bit extended length
pub const EXTENDED_LENGTH_16: u8 = 126;

/// Length byte announcing a 64-bit extended length (unsupported)
const EXTENDED_LENGTH_64: u8 = 127;

const MASK_BIT: u8 = 0x80;

/// Largest payload a single frame can carry in this dialect
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Consecutive non-data frames tolerated before giving up
pub const DEFAULT_MAX_SKIPPED_FRAMES: usize = 64;

const DISCARD_BUFFER_SIZE: usize = 512;

/// Frame type as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
	Text,
	Binary,
	/// Any other header byte (control frames, continuations, missing FIN)
	Other(u8),
}

impl Opcode {
	/// Classify a raw header byte
	pub fn from_header_byte(byte: u8) -> Self {
		if byte == FIN | OPCODE_TEXT {
			Opcode::Text
		} else if byte == FIN | OPCODE_BINARY {
			Opcode::Binary
		} else {
			Opcode::Other(byte)
		}
	}

	/// Raw header byte for this opcode
	pub fn header_byte(self) -> u8 {
		match self {
			Opcode::Text => FIN | OPCODE_TEXT,
			Opcode::Binary => FIN | OPCODE_BINARY,
			Opcode::Other(byte) => byte,
		}
	}

	/// Whether a frame of this type is surfaced to readers
	pub fn carries_data(self, allow_text: bool) -> bool {
		match self {
			Opcode::Binary => true,
			Opcode::Text => allow_text,
			Opcode::Other(_) => false,
		}
	}
}

/// One decoded frame, as seen by the device end of a connection
///
/// The client path only ever hands out payload bytes; `Frame` exists for
/// code that plays the device and needs frame boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
	pub opcode: Opcode,
	pub payload: Vec<u8>,
}

/// Encode a frame header for a payload of `len` bytes
pub fn encode_header(len: usize, opcode: Opcode) -> ProtocolResult<Vec<u8>> {
	if len > MAX_PAYLOAD_LEN {
		return Err(ProtocolError::FrameTooLarge { len });
	}
	let mut header = Vec::with_capacity(4);
	header.push(opcode.header_byte());
	if len < EXTENDED_LENGTH_16 as usize {
		header.push(len as u8);
	} else {
		header.push(EXTENDED_LENGTH_16);
		header.extend_from_slice(&(len as u16).to_be_bytes());
	}
	Ok(header)
}

/// Encode a complete frame (header followed by payload)
pub fn encode_frame(payload: &[u8], opcode: Opcode) -> ProtocolResult<Vec<u8>> {
	let mut frame = encode_header(payload.len(), opcode)?;
	frame.extend_from_slice(payload);
	Ok(frame)
}

/// Inbound half of the codec
///
/// Holds the unconsumed tail of the last data frame so that `read` can hand
/// out exactly the number of bytes asked for.
pub struct FrameReader<R> {
	inner: R,
	pending: Vec<u8>,
	max_skipped_frames: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
	pub fn new(inner: R) -> Self {
		Self { inner, pending: Vec::new(), max_skipped_frames: DEFAULT_MAX_SKIPPED_FRAMES }
	}

	/// Bound the number of consecutive non-data frames `read` will drain
	pub fn with_max_skipped_frames(mut self, max_skipped_frames: usize) -> Self {
		self.max_skipped_frames = max_skipped_frames;
		self
	}

	/// Bytes left over from the last decoded frame
	pub fn pending_len(&self) -> usize {
		self.pending.len()
	}

	pub fn into_inner(self) -> R {
		self.inner
	}

	async fn recv_exactly(&mut self, buf: &mut [u8]) -> ProtocolResult<()> {
		let mut filled = 0;
		while filled < buf.len() {
			let n = self.inner.read(&mut buf[filled..]).await?;
			if n == 0 {
				return Err(ProtocolError::StreamClosed);
			}
			filled += n;
		}
		Ok(())
	}

	async fn discard(&mut self, mut len: usize) -> ProtocolResult<()> {
		let mut scratch = [0u8; DISCARD_BUFFER_SIZE];
		while len > 0 {
			let want = len.min(scratch.len());
			let n = self.inner.read(&mut scratch[..want]).await?;
			if n == 0 {
				return Err(ProtocolError::StreamClosed);
			}
			trace!("Skip data: {}", hex::encode(&scratch[..n]));
			len -= n;
		}
		Ok(())
	}

	async fn read_header(&mut self) -> ProtocolResult<(Opcode, usize)> {
		let mut header = [0u8; 2];
		self.recv_exactly(&mut header).await?;
		let opcode = Opcode::from_header_byte(header[0]);

		if header[1] & MASK_BIT != 0 {
			return Err(ProtocolError::ProtocolViolation(format!(
				"masked frame from server (header {:02x}{:02x})",
				header[0], header[1]
			)));
		}

		let len = match header[1] {
			EXTENDED_LENGTH_16 => {
				let mut ext = [0u8; 2];
				self.recv_exactly(&mut ext).await?;
				u16::from_be_bytes(ext) as usize
			}
			EXTENDED_LENGTH_64 => {
				return Err(ProtocolError::ProtocolViolation(
					"64-bit frame lengths are not supported".to_string(),
				));
			}
			n => n as usize,
		};
		Ok((opcode, len))
	}

	/// Decode one frame of any type
	///
	/// Nothing is skipped and boundaries are kept, which is what a device
	/// side reading request headers and PUT chunks needs. Clients use `read`.
	pub async fn next_frame(&mut self) -> ProtocolResult<Frame> {
		let (opcode, len) = self.read_header().await?;
		let mut payload = vec![0u8; len];
		self.recv_exactly(&mut payload).await?;
		Ok(Frame { opcode, payload })
	}

	/// Decode frames until a data frame arrives, draining everything else
	async fn decode_next_frame(&mut self, allow_text: bool) -> ProtocolResult<Vec<u8>> {
		let mut skipped = 0;
		loop {
			let (opcode, len) = self.read_header().await?;
			if opcode.carries_data(allow_text) {
				let mut payload = vec![0u8; len];
				self.recv_exactly(&mut payload).await?;
				return Ok(payload);
			}

			skipped += 1;
			if skipped > self.max_skipped_frames {
				return Err(ProtocolError::TooManySkippedFrames { skipped });
			}
			debug!("Got unexpected websocket frame {:?} of {} bytes, skipping it", opcode, len);
			self.discard(len).await?;
		}
	}

	/// Next whole message: leftover bytes first, otherwise the next data frame
	pub async fn next_message(&mut self, allow_text: bool) -> ProtocolResult<Vec<u8>> {
		if !self.pending.is_empty() {
			return Ok(std::mem::take(&mut self.pending));
		}
		self.decode_next_frame(allow_text).await
	}

	/// Read exactly `size` bytes, spanning frames as needed
	pub async fn read(&mut self, size: usize, allow_text: bool) -> ProtocolResult<Vec<u8>> {
		let mut out = Vec::with_capacity(size);
		while out.len() < size {
			if self.pending.is_empty() {
				self.pending = self.decode_next_frame(allow_text).await?;
				continue;
			}
			let take = (size - out.len()).min(self.pending.len());
			out.extend(self.pending.drain(..take));
		}
		Ok(out)
	}
}

/// Outbound half of the codec
pub struct FrameWriter<W> {
	inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}

	pub fn into_inner(self) -> W {
		self.inner
	}

	/// Send one frame and flush it
	pub async fn write_frame(&mut self, payload: &[u8], opcode: Opcode) -> ProtocolResult<()> {
		let frame = encode_frame(payload, opcode)?;
		self.inner.write_all(&frame).await?;
		self.inner.flush().await?;
		Ok(())
	}

	pub async fn write_binary(&mut self, payload: &[u8]) -> ProtocolResult<()> {
		self.write_frame(payload, Opcode::Binary).await
	}

	pub async fn write_text(&mut self, payload: &[u8]) -> ProtocolResult<()> {
		self.write_frame(payload, Opcode::Text).await
	}

	pub async fn shutdown(&mut self) -> ProtocolResult<()> {
		self.inner.shutdown().await?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn frames(parts: &[(&[u8], Opcode)]) -> Vec<u8> {
		let mut out = Vec::new();
		for (payload, opcode) in parts {
			out.extend(encode_frame(payload, *opcode).unwrap());
		}
		out
	}

	#[test]
	fn test_header_length_boundaries() {
		for &len in &[0usize, 1, 125] {
			let header = encode_header(len, Opcode::Binary).unwrap();
			assert_eq!(header, vec![0x82, len as u8]);
		}
		for &len in &[126usize, 127, 65535] {
			let header = encode_header(len, Opcode::Binary).unwrap();
			assert_eq!(header.len(), 4);
			assert_eq!(header[1], 126);
			assert_eq!(u16::from_be_bytes([header[2], header[3]]) as usize, len);
		}
	}

	#[test]
	fn test_oversized_payload_rejected() {
		let payload = vec![0u8; MAX_PAYLOAD_LEN + 1];
		assert!(matches!(
			encode_frame(&payload, Opcode::Binary),
			Err(ProtocolError::FrameTooLarge { len }) if len == MAX_PAYLOAD_LEN + 1
		));
	}

	#[test]
	fn test_opcode_classification() {
		assert_eq!(Opcode::from_header_byte(0x81), Opcode::Text);
		assert_eq!(Opcode::from_header_byte(0x82), Opcode::Binary);
		assert_eq!(Opcode::from_header_byte(0x89), Opcode::Other(0x89));
		// Binary without FIN is a fragment, not data
		assert_eq!(Opcode::from_header_byte(0x02), Opcode::Other(0x02));
		assert!(!Opcode::Text.carries_data(false));
		assert!(Opcode::Text.carries_data(true));
	}

	#[tokio::test]
	async fn test_read_spans_frames() {
		let data = frames(&[(b"ab", Opcode::Binary), (b"cde", Opcode::Binary)]);
		let mut reader = FrameReader::new(&data[..]);
		assert_eq!(reader.read(4, false).await.unwrap(), b"abcd");
		assert_eq!(reader.pending_len(), 1);
		assert_eq!(reader.read(1, false).await.unwrap(), b"e");
	}

	#[tokio::test]
	async fn test_text_skipped_unless_allowed() {
		let data = frames(&[(b"prompt", Opcode::Text), (b"bin", Opcode::Binary)]);
		let mut reader = FrameReader::new(&data[..]);
		assert_eq!(reader.read(3, false).await.unwrap(), b"bin");

		let mut reader = FrameReader::new(&data[..]);
		assert_eq!(reader.read(6, true).await.unwrap(), b"prompt");
	}

	#[tokio::test]
	async fn test_masked_frame_is_violation() {
		let data = [0x82u8, 0x81, 0, 0, 0, 0, b'x'];
		let mut reader = FrameReader::new(&data[..]);
		assert!(matches!(reader.read(1, false).await, Err(ProtocolError::ProtocolViolation(_))));
	}

	#[tokio::test]
	async fn test_next_message_returns_leftover_first() {
		let data = frames(&[(b"Password: hello", Opcode::Text), (b"next", Opcode::Text)]);
		let mut reader = FrameReader::new(&data[..]);
		assert_eq!(reader.read(10, true).await.unwrap(), b"Password: ");
		assert_eq!(reader.next_message(true).await.unwrap(), b"hello");
		assert_eq!(reader.next_message(true).await.unwrap(), b"next");
	}

	#[tokio::test]
	async fn test_zero_length_read_touches_nothing() {
		let data: [u8; 0] = [];
		let mut reader = FrameReader::new(&data[..]);
		assert!(reader.read(0, false).await.unwrap().is_empty());
	}
}

// vim: ts=4
