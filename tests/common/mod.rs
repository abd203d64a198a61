//! Simulated WebREPL device for integration tests
//!
//! The device end of a `tokio::io::duplex` pipe: optional HTTP upgrade,
//! password prompt, then file requests against an in-memory file store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

use webrepl::protocol::request::REQUEST_HEADER_LEN;
use webrepl::protocol::{FileRequest, FrameCodec, Operation, ProtocolError, ProtocolResult, TransferResponse};
use webrepl::session::WebReplSession;

pub type FileStore = Arc<Mutex<HashMap<String, Vec<u8>>>>;

pub const DEVICE_VERSION: [u8; 3] = [1, 22, 0];

/// Device behaviour knobs
#[derive(Debug, Clone)]
pub struct DeviceOptions {
	/// Bytes per GET chunk
	pub chunk_size: usize,
	/// Status for the first response to any request
	pub first_status: u16,
	/// Status after a completed transfer
	pub final_status: u16,
	/// Corrupt the signature of every response
	pub bad_magic: bool,
	/// Close the stream after this many GET chunks
	pub drop_after_chunks: Option<usize>,
	/// Stop answering after this many GET chunks
	pub stall_after_chunks: Option<usize>,
}

impl Default for DeviceOptions {
	fn default() -> Self {
		Self { chunk_size: 256, first_status: 0, final_status: 0, bad_magic: false, drop_after_chunks: None, stall_after_chunks: None }
	}
}

pub fn new_store() -> FileStore {
	Arc::new(Mutex::new(HashMap::new()))
}

fn response(status: u16, options: &DeviceOptions) -> Vec<u8> {
	let mut rec = TransferResponse { status }.encode().to_vec();
	if options.bad_magic {
		rec[0..2].copy_from_slice(b"XX");
	}
	rec
}

/// Prompt text the device sends after the upgrade
pub const LOGIN_BANNER: &[u8] = b"\r\nWebREPL connected\r\nPassword: ";

/// Serve file requests on an already upgraded stream until it closes
pub async fn serve_requests<S>(stream: S, files: FileStore, options: DeviceOptions) -> ProtocolResult<()>
where
	S: AsyncRead + AsyncWrite + Send + 'static,
{
	serve_device(stream, files, options, false).await.map(|_| ())
}

/// Like `serve_requests`, with the password prompt first
///
/// Returns the password frame the client sent.
pub async fn serve_device<S>(
	stream: S,
	files: FileStore,
	options: DeviceOptions,
	prompt: bool,
) -> ProtocolResult<Option<Vec<u8>>>
where
	S: AsyncRead + AsyncWrite + Send + 'static,
{
	let (mut reader, mut writer) = FrameCodec::new(stream).into_split();
	let mut password = None;
	if prompt {
		writer.write_text(LOGIN_BANNER).await?;
		password = Some(reader.next_frame().await?.payload);
	}
	loop {
		let header = match reader.read(REQUEST_HEADER_LEN, false).await {
			Ok(header) => header,
			Err(ProtocolError::StreamClosed) => return Ok(password),
			Err(e) => return Err(e),
		};
		let request = FileRequest::decode(&header)?;
		let name = String::from_utf8_lossy(request.file_name()).into_owned();

		match request.operation() {
			Operation::GetVersion => writer.write_binary(&DEVICE_VERSION).await?,
			Operation::Put => {
				writer.write_binary(&response(options.first_status, &options)).await?;
				if options.first_status != 0 {
					continue;
				}
				let data = reader.read(request.file_size() as usize, false).await?;
				files.lock().unwrap().insert(name, data);
				writer.write_binary(&response(options.final_status, &options)).await?;
			}
			Operation::Get => {
				let data = files.lock().unwrap().get(&name).cloned();
				let data = match data {
					Some(data) if options.first_status == 0 => data,
					_ => {
						let status = if options.first_status != 0 { options.first_status } else { 2 };
						writer.write_binary(&response(status, &options)).await?;
						continue;
					}
				};
				writer.write_binary(&response(0, &options)).await?;
				for (sent, chunk) in data.chunks(options.chunk_size).enumerate() {
					if options.drop_after_chunks == Some(sent) {
						writer.shutdown().await?;
						return Ok(password);
					}
					if options.stall_after_chunks == Some(sent) {
						std::future::pending::<()>().await;
					}
					assert_eq!(reader.read(1, false).await?, vec![0]);
					let mut msg = (chunk.len() as u16).to_le_bytes().to_vec();
					msg.extend_from_slice(chunk);
					writer.write_binary(&msg).await?;
				}
				assert_eq!(reader.read(1, false).await?, vec![0]);
				writer.write_binary(&0u16.to_le_bytes()).await?;
				writer.write_binary(&response(options.final_status, &options)).await?;
			}
		}
	}
}

/// Session wired to a simulated device, login skipped
pub fn session_with_device(
	files: FileStore,
	options: DeviceOptions,
) -> (WebReplSession<FrameCodec<DuplexStream>>, JoinHandle<ProtocolResult<()>>) {
	let (client, device) = tokio::io::duplex(64 * 1024);
	let task = tokio::spawn(serve_requests(device, files, options));
	let mut session = WebReplSession::new(FrameCodec::new(client), "secret");
	session.enable_binary_mode().unwrap();
	(session, task)
}

/// Answer the HTTP upgrade with `status_line` and return the request head
pub async fn answer_upgrade<S>(device: &mut S, status_line: &str) -> String
where
	S: AsyncRead + AsyncWrite + Unpin,
{
	let mut head = String::new();
	{
		let mut reader = BufReader::new(&mut *device);
		loop {
			let mut line = String::new();
			reader.read_line(&mut line).await.unwrap();
			head.push_str(&line);
			if line == "\r\n" || line.is_empty() {
				break;
			}
		}
	}
	let reply = format!("{}\r\nServer: test\r\nUpgrade: websocket\r\n\r\n", status_line);
	device.write_all(reply.as_bytes()).await.unwrap();
	head
}

// vim: ts=4
