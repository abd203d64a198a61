//! Interactive session state
//!
//! Both the keyboard path and the remote path mutate one `ReplState`. The
//! controller owns it and drives it from a single task, so no locking is
//! involved.

use tracing::{debug, trace};

use super::echo::EchoTracker;
use super::mode::{remap_control_line, ReplMode, CTRL_C, CTRL_D, EXIT_COMMAND};

/// Reply of the raw REPL accepting a chunk of code
pub const RAW_OK: &[u8] = b"OK";

/// Paste-mode prompt as it follows the echo of a carriage return
pub const PASTE_MARKER: &[u8] = b"\n=== ";

/// Number of 0x04 terminators following a raw REPL `OK`
const RAW_EOT_COUNT: u8 = 2;

/// What the controller should do after local input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
	/// Write these bytes to the device
	Send(Vec<u8>),
	/// Close the session
	Exit,
}

#[derive(Debug, Default)]
pub struct ReplState {
	mode: ReplMode,
	echo: EchoTracker,
	raw_ok_expected: bool,
	raw_eot_expected: u8,
}

impl ReplState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mode(&self) -> ReplMode {
		self.mode
	}

	pub fn echo(&self) -> &EchoTracker {
		&self.echo
	}

	/// A complete line typed by the user, without terminator
	pub fn submit_line(&mut self, line: &[u8]) -> LocalAction {
		if line == EXIT_COMMAND {
			return LocalAction::Exit;
		}
		if let Some(byte) = remap_control_line(line) {
			return self.send_control(byte);
		}

		let terminator = self.mode.line_terminator();
		let mut payload = Vec::with_capacity(line.len() + terminator.len());
		payload.extend_from_slice(line);
		payload.extend_from_slice(terminator);
		if self.mode.records_echo() {
			self.echo.record(&payload);
		}
		LocalAction::Send(payload)
	}

	/// A single control byte
	pub fn send_control(&mut self, byte: u8) -> LocalAction {
		if self.mode == ReplMode::Raw && byte == CTRL_D {
			self.raw_ok_expected = true;
		}

		let next = self.mode.after_control(byte);
		if next != self.mode {
			debug!("REPL mode {:?} -> {:?}", self.mode, next);
			self.mode = next;
			self.echo.clear();
			self.raw_ok_expected = false;
			self.raw_eot_expected = 0;
		}
		LocalAction::Send(vec![byte])
	}

	/// Keyboard interrupt
	pub fn interrupt(&mut self) -> LocalAction {
		self.send_control(CTRL_C)
	}

	/// Process one inbound message, returning what to show locally
	pub fn on_remote(&mut self, msg: &[u8]) -> Vec<u8> {
		let mut rest = &msg[self.echo.consume(msg)..];

		if self.mode == ReplMode::Paste
			&& rest.starts_with(PASTE_MARKER)
			&& self.echo.last_consumed() == Some(b'\r')
		{
			self.echo.inject_newline();
			rest = &rest[self.echo.consume(rest)..];
		}

		if !rest.is_empty() && !self.echo.is_empty() {
			trace!("{} echo bytes still pending after output", self.echo.pending().len());
		}

		if self.raw_ok_expected && !rest.is_empty() {
			self.raw_ok_expected = false;
			if rest.starts_with(RAW_OK) {
				rest = &rest[RAW_OK.len()..];
				self.raw_eot_expected = RAW_EOT_COUNT;
			}
		}

		let mut out = Vec::with_capacity(rest.len());
		for &byte in rest {
			if byte == CTRL_D && self.raw_eot_expected > 0 {
				self.raw_eot_expected -= 1;
				continue;
			}
			out.push(byte);
		}
		out
	}
}


// vim: ts=4
