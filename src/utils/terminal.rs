//! Terminal mode management for the interactive session

use std::io::{self, BufRead, Write};
use termios::{tcsetattr, Termios, ECHO, ICANON, TCSANOW};

const STDIN_FD: i32 = 0;

/// Whether stdin is a terminal
pub fn stdin_is_tty() -> bool {
	// SAFETY: isatty only inspects the descriptor
	unsafe { libc::isatty(STDIN_FD) == 1 }
}

/// RAII guard for non-canonical, non-echoing input
///
/// Signals stay enabled so ^C still reaches the process. The original
/// settings come back on drop.
pub struct TerminalGuard {
	fd: i32,
	original: Termios,
}

impl TerminalGuard {
	/// Switch stdin; `None` if it is not a terminal
	pub fn new() -> Option<Self> {
		if !stdin_is_tty() {
			return None;
		}
		let original = Termios::from_fd(STDIN_FD).ok()?;
		let mut raw = original;
		raw.c_lflag &= !(ICANON | ECHO);
		if tcsetattr(STDIN_FD, TCSANOW, &raw).is_err() {
			return None;
		}
		Some(TerminalGuard { fd: STDIN_FD, original })
	}
}

impl Drop for TerminalGuard {
	fn drop(&mut self) {
		let _ = io::stdout().flush();
		let _ = tcsetattr(self.fd, TCSANOW, &self.original);
	}
}

/// Prompt on stderr and read one line from stdin with echo off
pub fn read_password(prompt: &str) -> io::Result<String> {
	let mut stderr = io::stderr();
	write!(stderr, "{}", prompt)?;
	stderr.flush()?;

	let saved = if stdin_is_tty() { Termios::from_fd(STDIN_FD).ok() } else { None };
	if let Some(original) = saved {
		let mut quiet = original;
		quiet.c_lflag &= !ECHO;
		tcsetattr(STDIN_FD, TCSANOW, &quiet)?;
	}

	let mut line = String::new();
	let result = io::stdin().lock().read_line(&mut line);

	if let Some(original) = saved {
		let _ = tcsetattr(STDIN_FD, TCSANOW, &original);
		let _ = writeln!(stderr);
	}
	result?;

	while line.ends_with('\n') || line.ends_with('\r') {
		line.pop();
	}
	Ok(line)
}


// vim: ts=4
