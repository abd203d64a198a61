//! WebREPL session
//!
//! A session owns one transport exclusively. It performs the password login,
//! answers version queries and exposes the byte-level primitives that the
//! file transfer and REPL layers build on.

use std::fmt;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};
use crate::protocol::request::RESPONSE_LEN;
use crate::protocol::traits::{IOCTL_DATA_OPCODE_BINARY, IOCTL_SET_DATA_OPCODE};
use crate::protocol::{
	perform_handshake, DeviceVersion, FileRequest, FrameCodec, ProtocolError, ProtocolResult,
	TransferResponse, WebSocketTransport,
};

/// Give up looking for the password prompt after this many bytes
pub const MAX_PROMPT_SCAN: usize = 4096;

/// Session over a websocket-like transport
pub struct WebReplSession<T> {
	transport: T,
	password: String,
	binary_mode: bool,
}

impl<T> fmt::Debug for WebReplSession<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebReplSession")
			.field("password", &"<redacted>")
			.field("binary_mode", &self.binary_mode)
			.finish()
	}
}

/// Open a TCP connection, retrying per `config`
///
/// Each attempt is bounded by `connect_timeout_ms`. When every attempt
/// fails the last error is reported; when every attempt timed out the result
/// is `ConnectionError::Timeout`.
pub async fn connect_with_retry(
	host: &str,
	port: u16,
	config: &ConnectionConfig,
) -> std::result::Result<TcpStream, ConnectionError> {
	let address = format!("{}:{}", host, port);
	let attempts = config.retry_count.max(1);
	let mut last_error: Option<io::Error> = None;

	for attempt in 1..=attempts {
		let connect = TcpStream::connect((host, port));
		match tokio::time::timeout(Duration::from_millis(config.connect_timeout_ms), connect).await
		{
			Ok(Ok(stream)) => {
				info!("Connected to {} (attempt {})", address, attempt);
				if let Err(e) = stream.set_nodelay(true) {
					debug!("Cannot set TCP_NODELAY: {}", e);
				}
				return Ok(stream);
			}
			Ok(Err(e)) => {
				warn!("Connect to {} failed (attempt {}/{}): {}", address, attempt, attempts, e);
				last_error = Some(e);
			}
			Err(_) => {
				warn!("Connect to {} timed out (attempt {}/{})", address, attempt, attempts);
				last_error = None;
			}
		}
		if attempt < attempts {
			tokio::time::sleep(Duration::from_millis(config.retry_delay_ms)).await;
		}
	}

	Err(match last_error {
		Some(source) => ConnectionError::ConnectFailed { address, source },
		None => ConnectionError::Timeout { address, attempts },
	})
}

impl WebReplSession<FrameCodec<TcpStream>> {
	/// Connect, upgrade and log in
	pub async fn connect(
		host: &str,
		port: u16,
		password: &str,
		config: &ConnectionConfig,
	) -> Result<Self> {
		let mut stream = connect_with_retry(host, port, config).await?;
		perform_handshake(&mut stream, host, config.strict_handshake).await?;
		debug!("Websocket upgrade complete");

		let codec = FrameCodec::new(stream).with_max_skipped_frames(config.max_skipped_frames);
		let mut session = WebReplSession::new(codec, password);
		session.login().await?;
		info!("Logged in to {}:{}", host, port);
		Ok(session)
	}
}

impl<T: WebSocketTransport> WebReplSession<T> {
	/// Wrap a transport whose handshake is already done
	pub fn new(transport: T, password: &str) -> Self {
		Self { transport, password: password.to_string(), binary_mode: false }
	}

	/// Scan for the `": "` password prompt and answer it
	///
	/// The device sends no verdict: a wrong password only shows up as the
	/// device closing the connection or later replies not making sense.
	pub async fn login(&mut self) -> ProtocolResult<()> {
		let mut prev = 0u8;
		let mut scanned = 0;
		loop {
			if scanned >= MAX_PROMPT_SCAN {
				return Err(ProtocolError::ProtocolViolation(format!(
					"no password prompt within {} bytes",
					MAX_PROMPT_SCAN
				)));
			}
			let byte = self.transport.read(1, true).await?;
			let c = byte.first().copied().ok_or(ProtocolError::StreamClosed)?;
			scanned += 1;
			if prev == b':' && c == b' ' {
				break;
			}
			prev = c;
		}
		debug!("Password prompt found after {} bytes", scanned);

		let mut reply = Vec::with_capacity(self.password.len() + 1);
		reply.extend_from_slice(self.password.as_bytes());
		reply.push(b'\r');
		self.transport.write(&reply, false).await
	}

	/// Switch outgoing data to binary frames
	pub fn enable_binary_mode(&mut self) -> ProtocolResult<()> {
		self.transport.ioctl(IOCTL_SET_DATA_OPCODE, IOCTL_DATA_OPCODE_BINARY)?;
		self.binary_mode = true;
		Ok(())
	}

	pub fn binary_mode(&self) -> bool {
		self.binary_mode
	}

	/// Ask the device for its firmware version
	pub async fn get_version(&mut self) -> ProtocolResult<DeviceVersion> {
		self.send_request(&FileRequest::get_version()).await?;
		let reply = self.transport.read(3, false).await?;
		DeviceVersion::from_bytes(&reply)
	}

	/// Send raw bytes as one binary frame
	pub async fn write(&mut self, data: &[u8]) -> ProtocolResult<()> {
		self.transport.write(data, false).await
	}

	/// Read exactly `size` bytes of binary payload
	pub async fn read(&mut self, size: usize) -> ProtocolResult<Vec<u8>> {
		self.transport.read(size, false).await
	}

	/// Send an encoded file request header
	pub async fn send_request(&mut self, request: &FileRequest) -> ProtocolResult<()> {
		let rec = request.encode();
		debug!("Request {:?}: {} ({} bytes)", request.operation(), hex::encode(&rec[..]), rec.len());
		self.transport.write(&rec, false).await
	}

	/// Read and decode one "WB" status record
	pub async fn read_response(&mut self) -> ProtocolResult<TransferResponse> {
		let data = self.transport.read(RESPONSE_LEN, false).await?;
		TransferResponse::decode(&data)
	}

	/// Shut the connection down
	pub async fn close(mut self) -> ProtocolResult<()> {
		self.transport.close().await
	}

	/// Give up the session and keep the transport
	pub fn into_transport(self) -> T {
		self.transport
	}
}


// vim: ts=4
