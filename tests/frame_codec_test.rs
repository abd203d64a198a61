//! Frame codec tests
//!
//! Exercise the reduced websocket framing against byte streams built by hand.

use tokio::io::AsyncWriteExt;

use webrepl::protocol::frame::{DEFAULT_MAX_SKIPPED_FRAMES, MAX_PAYLOAD_LEN};
use webrepl::protocol::{encode_frame, FrameReader, FrameWriter, Opcode, ProtocolError};

// ============================================================================
// Helper Functions
// ============================================================================

fn payload(len: usize) -> Vec<u8> {
	(0..len).map(|i| (i % 251) as u8).collect()
}

/// A ping-like frame the reader must skip
fn other_frame(len: usize) -> Vec<u8> {
	encode_frame(&payload(len), Opcode::Other(0x89)).unwrap()
}

// ============================================================================
// Encoding
// ============================================================================

#[tokio::test]
async fn test_length_boundaries() {
	for &len in &[0usize, 1, 125, 126, 127, 65535] {
		let data = payload(len);
		let frame = encode_frame(&data, Opcode::Binary).unwrap();

		let header_len = if len >= 126 { 4 } else { 2 };
		assert_eq!(frame.len(), header_len + len, "length {}", len);
		assert_eq!(frame[0], 0x82);
		if len >= 126 {
			assert_eq!(frame[1], 126);
			assert_eq!(u16::from_be_bytes([frame[2], frame[3]]) as usize, len);
		} else {
			assert_eq!(frame[1] as usize, len);
		}

		let mut reader = FrameReader::new(&frame[..]);
		assert_eq!(reader.read(len, false).await.unwrap(), data, "length {}", len);
	}
}

#[test]
fn test_oversized_payload_rejected() {
	let data = payload(MAX_PAYLOAD_LEN + 1);
	assert!(matches!(
		encode_frame(&data, Opcode::Binary),
		Err(ProtocolError::FrameTooLarge { len }) if len == MAX_PAYLOAD_LEN + 1
	));
}

#[tokio::test]
async fn test_writer_emits_one_frame_per_write() {
	let mut writer = FrameWriter::new(Vec::new());
	writer.write_binary(b"abc").await.unwrap();
	writer.write_text(b"d").await.unwrap();
	assert_eq!(writer.into_inner(), vec![0x82, 3, b'a', b'b', b'c', 0x81, 1, b'd']);
}

// ============================================================================
// Decoding
// ============================================================================

#[tokio::test]
async fn test_skips_non_data_frames() {
	for &n in &[0usize, 1, 5, DEFAULT_MAX_SKIPPED_FRAMES] {
		let mut stream = Vec::new();
		for i in 0..n {
			stream.extend(other_frame(i % 200));
		}
		stream.extend(encode_frame(b"payload", Opcode::Binary).unwrap());

		let mut reader = FrameReader::new(&stream[..]);
		assert_eq!(reader.read(7, false).await.unwrap(), b"payload", "{} skipped frames", n);
	}
}

#[tokio::test]
async fn test_too_many_skipped_frames() {
	let mut stream = Vec::new();
	for _ in 0..=DEFAULT_MAX_SKIPPED_FRAMES {
		stream.extend(other_frame(3));
	}
	stream.extend(encode_frame(b"late", Opcode::Binary).unwrap());

	let mut reader = FrameReader::new(&stream[..]);
	assert!(matches!(
		reader.read(4, false).await,
		Err(ProtocolError::TooManySkippedFrames { skipped }) if skipped == DEFAULT_MAX_SKIPPED_FRAMES + 1
	));
}

#[tokio::test]
async fn test_custom_skip_bound() {
	let mut stream = other_frame(1);
	stream.extend(other_frame(1));
	stream.extend(encode_frame(b"x", Opcode::Binary).unwrap());

	let mut reader = FrameReader::new(&stream[..]).with_max_skipped_frames(1);
	assert!(matches!(reader.read(1, false).await, Err(ProtocolError::TooManySkippedFrames { .. })));
}

#[tokio::test]
async fn test_text_frames_only_when_allowed() {
	let mut stream = encode_frame(b"Password: ", Opcode::Text).unwrap();
	stream.extend(encode_frame(b"bin", Opcode::Binary).unwrap());

	let mut reader = FrameReader::new(&stream[..]);
	assert_eq!(reader.read(3, false).await.unwrap(), b"bin");

	let mut reader = FrameReader::new(&stream[..]);
	assert_eq!(reader.read(10, true).await.unwrap(), b"Password: ");
}

#[tokio::test]
async fn test_read_spans_frames_and_keeps_leftover() {
	let mut stream = encode_frame(b"WB", Opcode::Binary).unwrap();
	stream.extend(encode_frame(b"\0\0tail", Opcode::Binary).unwrap());

	let mut reader = FrameReader::new(&stream[..]);
	assert_eq!(reader.read(4, false).await.unwrap(), b"WB\0\0");
	assert_eq!(reader.pending_len(), 4);
	assert_eq!(reader.next_message(false).await.unwrap(), b"tail");
}

#[tokio::test]
async fn test_truncated_payload_is_stream_closed() {
	let frame = encode_frame(&payload(300), Opcode::Binary).unwrap();
	let mut reader = FrameReader::new(&frame[..200]);
	assert!(matches!(reader.read(300, false).await, Err(ProtocolError::StreamClosed)));
}

#[tokio::test]
async fn test_eof_mid_read_is_stream_closed() {
	let (client, mut device) = tokio::io::duplex(256);
	device.write_all(&encode_frame(b"ab", Opcode::Binary).unwrap()).await.unwrap();
	drop(device);

	let mut reader = FrameReader::new(client);
	assert!(matches!(reader.read(4, false).await, Err(ProtocolError::StreamClosed)));
}

#[tokio::test]
async fn test_masked_and_64bit_frames_rejected() {
	let masked = [0x82u8, 0x80 | 1, 0, 0, 0, 0, b'x'];
	let mut reader = FrameReader::new(&masked[..]);
	assert!(matches!(reader.read(1, false).await, Err(ProtocolError::ProtocolViolation(_))));

	let long = [0x82u8, 127, 0, 0, 0, 0, 0, 0, 0, 1, b'x'];
	let mut reader = FrameReader::new(&long[..]);
	assert!(matches!(reader.read(1, false).await, Err(ProtocolError::ProtocolViolation(_))));
}

// vim: ts=4
