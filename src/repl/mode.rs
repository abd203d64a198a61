//! REPL sub-modes and the control bytes that switch between them

pub const CTRL_A: u8 = 0x01;
pub const CTRL_B: u8 = 0x02;
pub const CTRL_C: u8 = 0x03;
pub const CTRL_D: u8 = 0x04;
pub const CTRL_E: u8 = 0x05;

/// Line typed to leave the session locally
pub const EXIT_COMMAND: &[u8] = b"exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
	/// Friendly line-oriented REPL
	Normal,
	/// Programmatic raw REPL, entered with ^A and left with ^B
	Raw,
	/// Paste mode, entered with ^E and left with ^C or ^D
	Paste,
}

impl Default for ReplMode {
	fn default() -> Self {
		ReplMode::Normal
	}
}

impl ReplMode {
	/// Mode after sending `byte`; anything else keeps the current mode
	pub fn after_control(self, byte: u8) -> ReplMode {
		match (self, byte) {
			(ReplMode::Normal, CTRL_A) => ReplMode::Raw,
			(ReplMode::Normal, CTRL_E) => ReplMode::Paste,
			(ReplMode::Raw, CTRL_B) => ReplMode::Normal,
			(ReplMode::Paste, CTRL_C) | (ReplMode::Paste, CTRL_D) => ReplMode::Normal,
			(mode, _) => mode,
		}
	}

	pub fn line_terminator(self) -> &'static [u8] {
		match self {
			ReplMode::Normal => b"\r\n",
			ReplMode::Raw => b"\n",
			ReplMode::Paste => b"\r",
		}
	}

	/// The raw REPL does not echo input
	pub fn records_echo(self) -> bool {
		self != ReplMode::Raw
	}
}

/// Control byte for a line made of a single letter `A`..`E`
pub fn remap_control_line(line: &[u8]) -> Option<u8> {
	match line {
		[c @ b'A'..=b'E'] => Some(*c - 64),
		_ => None,
	}
}


// vim: ts=4
