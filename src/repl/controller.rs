//! Interactive REPL loop
//!
//! A reader task owns the inbound half of the codec and forwards decoded
//! messages over a channel; stdin is read on a plain thread. The controller
//! owns the outbound half and all session state, and reacts to whichever
//! source is ready.

use std::io::Read;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::editor::{EditorEvent, LineEditor};
use super::state::{LocalAction, ReplState};
use crate::error::Result;
use crate::protocol::{FrameCodec, FrameReader, FrameWriter, ProtocolError};
use crate::utils::signals::forward_interrupts;
use crate::utils::terminal::TerminalGuard;

const REMOTE_QUEUE: usize = 64;
const KEY_QUEUE: usize = 64;
const STDIN_BUFFER: usize = 256;

/// Shown when the device goes away
pub const DISCONNECTED_NOTICE: &[u8] = b"\r\nDisconnected\r\n";

/// Inbound side as seen by the controller
#[derive(Debug)]
pub enum RemoteEvent {
	Data(Vec<u8>),
	Closed(ProtocolError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
	Continue,
	Exit,
}

pub struct ReplController<W, O> {
	writer: FrameWriter<W>,
	output: O,
	state: ReplState,
	editor: LineEditor,
}

impl<W, O> ReplController<W, O>
where
	W: AsyncWrite + Unpin,
	O: AsyncWrite + Unpin,
{
	pub fn new(writer: FrameWriter<W>, output: O) -> Self {
		Self { writer, output, state: ReplState::new(), editor: LineEditor::new() }
	}

	pub fn state(&self) -> &ReplState {
		&self.state
	}

	pub fn into_parts(self) -> (FrameWriter<W>, O) {
		(self.writer, self.output)
	}

	async fn show(&mut self, bytes: &[u8]) -> Result<()> {
		if bytes.is_empty() {
			return Ok(());
		}
		self.output.write_all(bytes).await?;
		self.output.flush().await?;
		Ok(())
	}

	async fn apply(&mut self, action: LocalAction) -> Result<Flow> {
		match action {
			LocalAction::Send(bytes) => {
				self.writer.write_binary(&bytes).await?;
				Ok(Flow::Continue)
			}
			LocalAction::Exit => Ok(Flow::Exit),
		}
	}

	/// Bytes typed on the local keyboard
	pub async fn handle_keys(&mut self, keys: &[u8]) -> Result<Flow> {
		for &byte in keys {
			let action = match self.editor.feed(byte) {
				None => continue,
				Some(EditorEvent::Echo(bytes)) => {
					self.show(&bytes).await?;
					continue;
				}
				Some(EditorEvent::Submit(line)) => {
					self.show(b"\r\n").await?;
					self.state.submit_line(&line)
				}
				Some(EditorEvent::Control(byte)) => self.state.send_control(byte),
			};
			if self.apply(action).await? == Flow::Exit {
				return Ok(Flow::Exit);
			}
		}
		Ok(Flow::Continue)
	}

	/// One decoded message from the device
	pub async fn handle_remote(&mut self, data: &[u8]) -> Result<()> {
		let shown = self.state.on_remote(data);
		self.show(&shown).await
	}

	/// Keyboard interrupt: forward ^C, or give up if the link is gone
	pub async fn handle_interrupt(&mut self) -> Result<Flow> {
		let action = self.state.interrupt();
		match self.apply(action).await {
			Ok(flow) => Ok(flow),
			Err(e) => {
				debug!("Cannot forward interrupt: {}", e);
				Ok(Flow::Exit)
			}
		}
	}

	pub async fn disconnected(&mut self) -> Result<()> {
		self.show(DISCONNECTED_NOTICE).await
	}

	/// Close the outbound half
	pub async fn close(&mut self) {
		if let Err(e) = self.writer.shutdown().await {
			debug!("Error closing connection: {}", e);
		}
	}
}

/// Multiplex keyboard, device and interrupts until the session ends
///
/// Ends when the user types `exit`, local input reaches end of file, the
/// device closes, or an interrupt cannot be delivered.
pub async fn run_loop<W, O>(
	controller: &mut ReplController<W, O>,
	keys: &mut mpsc::Receiver<Vec<u8>>,
	remote: &mut mpsc::Receiver<RemoteEvent>,
	interrupts: &mut mpsc::Receiver<()>,
) -> Result<()>
where
	W: AsyncWrite + Unpin,
	O: AsyncWrite + Unpin,
{
	loop {
		tokio::select! {
			event = remote.recv() => match event {
				Some(RemoteEvent::Data(data)) => controller.handle_remote(&data).await?,
				Some(RemoteEvent::Closed(reason)) => {
					info!("Connection closed: {}", reason);
					controller.disconnected().await?;
					break;
				}
				None => {
					controller.disconnected().await?;
					break;
				}
			},
			key = keys.recv() => match key {
				Some(bytes) => {
					if controller.handle_keys(&bytes).await? == Flow::Exit {
						break;
					}
				}
				None => {
					debug!("Local input closed");
					break;
				}
			},
			Some(()) = interrupts.recv() => {
				if controller.handle_interrupt().await? == Flow::Exit {
					break;
				}
			}
		}
	}
	controller.close().await;
	Ok(())
}

/// Forward decoded messages until the stream fails
pub fn spawn_remote_reader<R>(mut reader: FrameReader<R>, tx: mpsc::Sender<RemoteEvent>) -> JoinHandle<()>
where
	R: AsyncRead + Unpin + Send + 'static,
{
	tokio::spawn(async move {
		loop {
			match reader.next_message(true).await {
				Ok(data) => {
					if tx.send(RemoteEvent::Data(data)).await.is_err() {
						break;
					}
				}
				Err(e) => {
					let _ = tx.send(RemoteEvent::Closed(e)).await;
					break;
				}
			}
		}
	})
}

/// Read stdin on a dedicated thread
///
/// Blocking reads cannot be cancelled, so the thread is left detached and
/// ends with the process.
pub fn spawn_stdin_reader(tx: mpsc::Sender<Vec<u8>>) {
	std::thread::spawn(move || {
		let mut stdin = std::io::stdin();
		let mut buf = [0u8; STDIN_BUFFER];
		loop {
			match stdin.read(&mut buf) {
				Ok(0) | Err(_) => break,
				Ok(n) => {
					if tx.blocking_send(buf[..n].to_vec()).is_err() {
						break;
					}
				}
			}
		}
	});
}

/// Run an interactive session on the controlling terminal
pub async fn run_interactive<S>(codec: FrameCodec<S>) -> Result<()>
where
	S: AsyncRead + AsyncWrite + Send + 'static,
{
	let (reader, writer) = codec.into_split();

	let (remote_tx, mut remote_rx) = mpsc::channel(REMOTE_QUEUE);
	let reader_task = spawn_remote_reader(reader, remote_tx);
	let (key_tx, mut key_rx) = mpsc::channel(KEY_QUEUE);
	spawn_stdin_reader(key_tx);
	let (interrupt_tx, mut interrupt_rx) = mpsc::channel(1);
	let interrupt_task = forward_interrupts(interrupt_tx);

	let guard = TerminalGuard::new();
	if guard.is_none() {
		debug!("stdin is not a terminal, running without raw mode");
	}

	let mut controller = ReplController::new(writer, tokio::io::stdout());
	let result = run_loop(&mut controller, &mut key_rx, &mut remote_rx, &mut interrupt_rx).await;

	reader_task.abort();
	interrupt_task.abort();
	drop(guard);
	result
}


// vim: ts=4
