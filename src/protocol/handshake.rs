//! HTTP upgrade that turns a raw stream into a framed websocket stream
//!
//! The request is fixed apart from the Host header. The key is a constant:
//! the WebREPL server does not validate it, so neither do we validate the
//! accept value it sends back.

use base64::Engine;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::error::ProtocolError;
use super::traits::ProtocolResult;

/// Nonce behind the constant Sec-WebSocket-Key
const KEY_NONCE: &[u8; 16] = b"the sample nonce";

/// Upper bound on the size of the HTTP response head
pub const MAX_RESPONSE_HEAD: usize = 8 * 1024;

/// Constant Sec-WebSocket-Key value
pub fn websocket_key() -> String {
	base64::engine::general_purpose::STANDARD.encode(KEY_NONCE)
}

/// Build the upgrade request
pub fn upgrade_request(host: &str) -> String {
	format!(
		"GET / HTTP/1.1\r\n\
		 Host: {}\r\n\
		 Connection: Upgrade\r\n\
		 Upgrade: websocket\r\n\
		 Sec-WebSocket-Key: {}\r\n\
		 Sec-WebSocket-Version: 13\r\n\
		 \r\n",
		host,
		websocket_key()
	)
}

/// Read one CRLF-terminated line byte by byte
///
/// The stream is not buffered, so nothing past the header block is consumed.
async fn read_line<S: AsyncRead + Unpin>(stream: &mut S, budget: &mut usize) -> ProtocolResult<Vec<u8>> {
	let mut line = Vec::new();
	loop {
		if *budget == 0 {
			return Err(ProtocolError::ProtocolViolation(format!(
				"HTTP response head exceeds {} bytes",
				MAX_RESPONSE_HEAD
			)));
		}
		let byte = stream.read_u8().await?;
		*budget -= 1;
		line.push(byte);
		if byte == b'\n' {
			return Ok(line);
		}
	}
}

/// Check that a status line carries 101
fn is_switching_protocols(status_line: &str) -> bool {
	let mut parts = status_line.split_whitespace();
	matches!((parts.next(), parts.next()), (Some(version), Some("101")) if version.starts_with("HTTP/"))
}

/// Perform the client side of the upgrade
///
/// With `strict` set, a status other than 101 is fatal. Without it, any
/// response that reaches the blank line is accepted.
pub async fn perform_handshake<S>(stream: &mut S, host: &str, strict: bool) -> ProtocolResult<()>
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	stream.write_all(upgrade_request(host).as_bytes()).await?;
	stream.flush().await?;

	let mut budget = MAX_RESPONSE_HEAD;
	let status = read_line(stream, &mut budget).await?;
	let status_line = String::from_utf8_lossy(&status).trim_end().to_string();
	debug!("Handshake status: {}", status_line);

	if !is_switching_protocols(&status_line) {
		if strict {
			return Err(ProtocolError::HandshakeRejected { status_line });
		}
		warn!("Ignoring unexpected handshake status: {}", status_line);
	}

	loop {
		let line = read_line(stream, &mut budget).await?;
		if line == b"\r\n" {
			break;
		}
		debug!("Handshake header: {}", String::from_utf8_lossy(&line).trim_end());
	}
	Ok(())
}


// vim: ts=4
