//! Local line editing for the raw-mode terminal
//!
//! With the terminal in non-canonical mode the editor does what the tty
//! would: echoes typed characters, handles backspace and assembles lines.

use super::mode::{CTRL_A, CTRL_E};

const BACKSPACE: u8 = 0x08;
const DELETE: u8 = 0x7f;
const ESCAPE: u8 = 0x1b;
const TAB: u8 = b'\t';

/// Result of feeding one keystroke
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
	/// Show these bytes on the local terminal
	Echo(Vec<u8>),
	/// Enter was pressed; the line excludes the terminator
	Submit(Vec<u8>),
	/// Control byte to send right away
	Control(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
	None,
	Start,
	Sequence,
}

#[derive(Debug)]
pub struct LineEditor {
	line: Vec<u8>,
	escape: Escape,
	last_was_cr: bool,
}

impl Default for LineEditor {
	fn default() -> Self {
		Self { line: Vec::new(), escape: Escape::None, last_was_cr: false }
	}
}

impl LineEditor {
	pub fn new() -> Self {
		Self::default()
	}

	/// Current unsubmitted line
	pub fn buffer(&self) -> &[u8] {
		&self.line
	}

	pub fn feed(&mut self, byte: u8) -> Option<EditorEvent> {
		let after_cr = self.last_was_cr;
		self.last_was_cr = byte == b'\r';

		// Cursor keys and friends: ESC [ ... final, ESC O x
		match self.escape {
			Escape::Start => {
				self.escape =
					if byte == b'[' || byte == b'O' { Escape::Sequence } else { Escape::None };
				return None;
			}
			Escape::Sequence => {
				if (0x40..=0x7e).contains(&byte) {
					self.escape = Escape::None;
				}
				return None;
			}
			Escape::None => {}
		}

		match byte {
			b'\n' if after_cr => None,
			b'\r' | b'\n' => Some(EditorEvent::Submit(std::mem::take(&mut self.line))),
			CTRL_A..=CTRL_E => Some(EditorEvent::Control(byte)),
			BACKSPACE | DELETE => self.erase(),
			ESCAPE => {
				self.escape = Escape::Start;
				None
			}
			TAB => self.insert(byte),
			b if b < 0x20 => None,
			_ => self.insert(byte),
		}
	}

	fn insert(&mut self, byte: u8) -> Option<EditorEvent> {
		self.line.push(byte);
		Some(EditorEvent::Echo(vec![byte]))
	}

	/// Remove the last character, including all bytes of a UTF-8 sequence
	fn erase(&mut self) -> Option<EditorEvent> {
		while let Some(byte) = self.line.pop() {
			if byte & 0xc0 != 0x80 {
				return Some(EditorEvent::Echo(b"\x08 \x08".to_vec()));
			}
		}
		None
	}
}


// vim: ts=4
