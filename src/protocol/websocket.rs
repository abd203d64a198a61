//! The websocket transport over a raw byte stream

use async_trait::async_trait;
use tokio::io::{split, AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

use super::error::ProtocolError;
use super::frame::{FrameReader, FrameWriter, Opcode};
use super::traits::*;

/// Frame codec owning both directions of a stream
pub struct FrameCodec<S> {
	reader: FrameReader<ReadHalf<S>>,
	writer: FrameWriter<WriteHalf<S>>,
	binary_writes: bool,
}

impl<S: AsyncRead + AsyncWrite> FrameCodec<S> {
	/// Wrap a stream that has already completed the HTTP upgrade
	pub fn new(stream: S) -> Self {
		let (read_half, write_half) = split(stream);
		Self {
			reader: FrameReader::new(read_half),
			writer: FrameWriter::new(write_half),
			binary_writes: false,
		}
	}

	/// Bound the number of consecutive non-data frames drained per read
	pub fn with_max_skipped_frames(mut self, max_skipped_frames: usize) -> Self {
		self.reader = self.reader.with_max_skipped_frames(max_skipped_frames);
		self
	}

	/// Whether `ioctl` switched outgoing data to binary frames
	pub fn binary_writes(&self) -> bool {
		self.binary_writes
	}

	/// Separate the halves so a reader task can run next to a writer
	pub fn into_split(self) -> (FrameReader<ReadHalf<S>>, FrameWriter<WriteHalf<S>>) {
		(self.reader, self.writer)
	}
}

#[async_trait]
impl<S> WebSocketTransport for FrameCodec<S>
where
	S: AsyncRead + AsyncWrite + Send + 'static,
{
	async fn write(&mut self, data: &[u8], text: bool) -> ProtocolResult<()> {
		let opcode = if text { Opcode::Text } else { Opcode::Binary };
		self.writer.write_frame(data, opcode).await
	}

	async fn read(&mut self, size: usize, allow_text: bool) -> ProtocolResult<Vec<u8>> {
		self.reader.read(size, allow_text).await
	}

	fn ioctl(&mut self, request: u32, value: u32) -> ProtocolResult<()> {
		if request != IOCTL_SET_DATA_OPCODE || value != IOCTL_DATA_OPCODE_BINARY {
			return Err(ProtocolError::UnsupportedIoctl { request, value });
		}
		self.binary_writes = true;
		Ok(())
	}

	async fn close(&mut self) -> ProtocolResult<()> {
		self.writer.shutdown().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::protocol::frame::encode_frame;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};

	#[tokio::test]
	async fn test_codec_writes_binary_frames() {
		let (client, mut device) = tokio::io::duplex(1024);
		let mut codec = FrameCodec::new(client);
		codec.write(b"hi", false).await.unwrap();

		let mut buf = [0u8; 4];
		device.read_exact(&mut buf).await.unwrap();
		assert_eq!(buf, [0x82, 2, b'h', b'i']);
	}

	#[tokio::test]
	async fn test_codec_reads_through_frames() {
		let (client, mut device) = tokio::io::duplex(1024);
		let mut codec = FrameCodec::new(client);
		device.write_all(&encode_frame(b"WB\0\0", Opcode::Binary).unwrap()).await.unwrap();
		assert_eq!(codec.read(4, false).await.unwrap(), b"WB\0\0");
	}

	#[test]
	fn test_ioctl_accepts_only_binary_switch() {
		let (client, _device) = tokio::io::duplex(64);
		let mut codec = FrameCodec::new(client);
		assert!(matches!(
			codec.ioctl(9, 1),
			Err(ProtocolError::UnsupportedIoctl { request: 9, value: 1 })
		));
		assert!(!codec.binary_writes());
		codec.ioctl(9, 2).unwrap();
		assert!(codec.binary_writes());
	}
}

// vim: ts=4
