//! File transfer over a logged-in session
//!
//! One PUT or GET occupies the session until its final status record has
//! been read. Any failure aborts the whole operation; there is no resume.
//!
//! PUT: request header, status, file bytes in `chunk_size` frames, status.
//! GET: request header, status, then per chunk a one-byte probe answered by
//! a u16 little-endian length and that many bytes, until a zero length;
//! finally a status.

use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::callbacks::{ProgressCallback, TransferDirection, TransferEvent};
use crate::config::{TransferConfig, DEFAULT_CHUNK_SIZE};
use crate::error::{Result, WebReplError};
use crate::protocol::frame::MAX_PAYLOAD_LEN;
use crate::protocol::{FileRequest, ProtocolError, WebSocketTransport};
use crate::session::WebReplSession;
use crate::utils::signals::Termination;

/// Probe byte requesting the next GET chunk
pub const GET_CHUNK_PROBE: u8 = 0;

/// Per-transfer settings
#[derive(Debug, Clone)]
pub struct TransferOptions {
	pub chunk_size: usize,
	/// Prepended to every remote path
	pub sandbox: String,
}

impl Default for TransferOptions {
	fn default() -> Self {
		Self { chunk_size: DEFAULT_CHUNK_SIZE, sandbox: String::new() }
	}
}

impl From<&TransferConfig> for TransferOptions {
	fn from(config: &TransferConfig) -> Self {
		Self { chunk_size: config.chunk_size, sandbox: config.sandbox.clone() }
	}
}

impl TransferOptions {
	/// Remote file name as sent on the wire
	pub fn remote_name(&self, remote_path: &str) -> Vec<u8> {
		let mut name = Vec::with_capacity(self.sandbox.len() + remote_path.len());
		name.extend_from_slice(self.sandbox.as_bytes());
		name.extend_from_slice(remote_path.as_bytes());
		name
	}

	fn check_chunk_size(&self) -> Result<()> {
		if self.chunk_size == 0 || self.chunk_size > MAX_PAYLOAD_LEN {
			return Err(WebReplError::InvalidConfig {
				message: format!("chunk size {} out of range", self.chunk_size),
			});
		}
		Ok(())
	}
}

/// Fill `buf` from `reader`, stopping early only at end of input
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
	let mut filled = 0;
	while filled < buf.len() {
		let n = reader.read(&mut buf[filled..]).await?;
		if n == 0 {
			break;
		}
		filled += n;
	}
	Ok(filled)
}

/// Upload `size` bytes from `reader` to `remote_path`
///
/// Returns the number of bytes sent. The name is validated before anything
/// is written to the session.
pub async fn put_from_reader<T, R>(
	session: &mut WebReplSession<T>,
	reader: &mut R,
	size: u64,
	remote_path: &str,
	options: &TransferOptions,
	progress: &dyn ProgressCallback,
) -> Result<u64>
where
	T: WebSocketTransport,
	R: AsyncRead + Unpin,
{
	options.check_chunk_size()?;
	let request = FileRequest::put(&options.remote_name(remote_path), size)?;

	session.send_request(&request).await?;
	session.read_response().await?.ensure_success()?;
	progress.on_event(TransferEvent::Started {
		direction: TransferDirection::Put,
		remote_path: remote_path.to_string(),
		total_bytes: Some(size),
	});

	let mut buf = vec![0u8; options.chunk_size];
	let mut sent = 0u64;
	while sent < size {
		let want = (size - sent).min(buf.len() as u64) as usize;
		let n = read_full(reader, &mut buf[..want]).await?;
		if n == 0 {
			return Err(WebReplError::Io(std::io::Error::new(
				std::io::ErrorKind::UnexpectedEof,
				format!("local input ended after {} of {} bytes", sent, size),
			)));
		}
		session.write(&buf[..n]).await?;
		sent += n as u64;
		progress.on_event(TransferEvent::Progress {
			direction: TransferDirection::Put,
			bytes_transferred: sent,
			total_bytes: Some(size),
		});
	}

	session.read_response().await?.ensure_success()?;
	progress.on_event(TransferEvent::Finished {
		direction: TransferDirection::Put,
		bytes_transferred: sent,
	});
	debug!("PUT {} complete, {} bytes", remote_path, sent);
	Ok(sent)
}

/// Upload a local file
pub async fn put_file<T: WebSocketTransport>(
	session: &mut WebReplSession<T>,
	local_path: &Path,
	remote_path: &str,
	options: &TransferOptions,
	progress: &dyn ProgressCallback,
) -> Result<u64> {
	let mut file = tokio::fs::File::open(local_path).await?;
	let size = file.metadata().await?.len();
	put_from_reader(session, &mut file, size, remote_path, options, progress).await
}

/// Download `remote_path` into `writer`
///
/// Returns the number of bytes received.
pub async fn get_to_writer<T, W>(
	session: &mut WebReplSession<T>,
	writer: &mut W,
	remote_path: &str,
	options: &TransferOptions,
	progress: &dyn ProgressCallback,
) -> Result<u64>
where
	T: WebSocketTransport,
	W: AsyncWrite + Unpin,
{
	let request = FileRequest::get(&options.remote_name(remote_path))?;

	session.send_request(&request).await?;
	session.read_response().await?.ensure_success()?;
	progress.on_event(TransferEvent::Started {
		direction: TransferDirection::Get,
		remote_path: remote_path.to_string(),
		total_bytes: None,
	});

	let mut received = 0u64;
	loop {
		session.write(&[GET_CHUNK_PROBE]).await?;
		let len = match session.read(2).await?[..] {
			[lo, hi] => u16::from_le_bytes([lo, hi]) as usize,
			_ => return Err(ProtocolError::StreamClosed.into()),
		};
		if len == 0 {
			break;
		}
		let data = session.read(len).await?;
		if data.len() != len {
			return Err(ProtocolError::StreamClosed.into());
		}
		writer.write_all(&data).await?;
		received += len as u64;
		progress.on_event(TransferEvent::Progress {
			direction: TransferDirection::Get,
			bytes_transferred: received,
			total_bytes: None,
		});
	}
	writer.flush().await?;

	session.read_response().await?.ensure_success()?;
	progress.on_event(TransferEvent::Finished {
		direction: TransferDirection::Get,
		bytes_transferred: received,
	});
	debug!("GET {} complete, {} bytes", remote_path, received);
	Ok(received)
}

/// Temporary name a download is streamed into
pub fn partial_path(path: &Path) -> PathBuf {
	let mut name: OsString = path.as_os_str().to_os_string();
	name.push(".part");
	PathBuf::from(name)
}

/// Download a remote file to `local_path`
///
/// Data goes to `<local_path>.part` first and is renamed on success; on
/// failure the partial file is removed and `local_path` is left untouched.
pub async fn get_file<T: WebSocketTransport>(
	session: &mut WebReplSession<T>,
	remote_path: &str,
	local_path: &Path,
	options: &TransferOptions,
	progress: &dyn ProgressCallback,
) -> Result<u64> {
	get_file_until(session, remote_path, local_path, options, progress, std::future::pending()).await
}

/// Like `get_file`, abandoned when `stop` resolves first
///
/// A stopped download cleans up like any other failure and returns
/// `WebReplError::Interrupted`.
pub async fn get_file_until<T, F>(
	session: &mut WebReplSession<T>,
	remote_path: &str,
	local_path: &Path,
	options: &TransferOptions,
	progress: &dyn ProgressCallback,
	stop: F,
) -> Result<u64>
where
	T: WebSocketTransport,
	F: Future<Output = Termination>,
{
	FileRequest::get(&options.remote_name(remote_path))?;

	let part = partial_path(local_path);
	let mut file = tokio::fs::File::create(&part).await?;
	let result = tokio::select! {
		result = get_to_writer(session, &mut file, remote_path, options, progress) => result,
		signal = stop => Err(WebReplError::Interrupted(signal)),
	};
	drop(file);

	match result {
		Ok(received) => {
			tokio::fs::rename(&part, local_path).await?;
			Ok(received)
		}
		Err(e) => {
			if let Err(rm) = tokio::fs::remove_file(&part).await {
				warn!("Cannot remove partial download {}: {}", part.display(), rm);
			}
			Err(e)
		}
	}
}


// vim: ts=4
