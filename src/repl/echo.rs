//! Pending-echo tracking
//!
//! Holds the bytes we sent that the device has not echoed back yet. Inbound
//! messages consume the longest prefix they share with it.

use std::collections::VecDeque;

#[derive(Debug, Default)]
pub struct EchoTracker {
	pending: VecDeque<u8>,
	last_consumed: Option<u8>,
}

impl EchoTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Remember bytes just sent to the device
	pub fn record(&mut self, sent: &[u8]) {
		self.pending.extend(sent.iter().copied());
	}

	/// Consume the prefix `incoming` shares with the pending echo
	///
	/// Returns how many leading bytes of `incoming` were echo.
	pub fn consume(&mut self, incoming: &[u8]) -> usize {
		let mut n = 0;
		while n < incoming.len() && self.pending.front() == Some(&incoming[n]) {
			self.last_consumed = self.pending.pop_front();
			n += 1;
		}
		n
	}

	/// Expect a newline before anything already pending
	pub fn inject_newline(&mut self) {
		self.pending.push_front(b'\n');
	}

	pub fn clear(&mut self) {
		self.pending.clear();
		self.last_consumed = None;
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	pub fn pending(&self) -> Vec<u8> {
		self.pending.iter().copied().collect()
	}

	/// Most recent byte confirmed as echo
	pub fn last_consumed(&self) -> Option<u8> {
		self.last_consumed
	}
}


// vim: ts=4
