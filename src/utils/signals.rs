//! Signal handling
//!
//! Transfers stop on SIGINT/SIGTERM after cleaning up, then exit with the
//! conventional status. The interactive session turns SIGINT into a ^C for
//! the device instead.

use std::fmt;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Signal that asked the process to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
	Interrupt,
	Terminate,
}

impl Termination {
	/// Shell convention: 128 + signal number
	pub fn exit_code(self) -> i32 {
		match self {
			Termination::Interrupt => 130,
			Termination::Terminate => 143,
		}
	}
}

impl fmt::Display for Termination {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Termination::Interrupt => write!(f, "SIGINT"),
			Termination::Terminate => write!(f, "SIGTERM"),
		}
	}
}

/// Resolve on the first SIGINT or SIGTERM
///
/// If a handler cannot be installed this never resolves, and the default
/// signal disposition applies.
pub async fn wait_for_termination() -> Termination {
	let streams = signal(SignalKind::terminate()).and_then(|t| Ok((t, signal(SignalKind::interrupt())?)));
	let (mut sigterm, mut sigint) = match streams {
		Ok(streams) => streams,
		Err(e) => {
			warn!("Failed to setup signal handlers: {}", e);
			return std::future::pending().await;
		}
	};

	let received = tokio::select! {
		_ = sigterm.recv() => Termination::Terminate,
		_ = sigint.recv() => Termination::Interrupt,
	};
	debug!("Received {}, aborting transfer", received);
	received
}

/// Deliver every SIGINT as a message instead of terminating
pub fn forward_interrupts(tx: mpsc::Sender<()>) -> JoinHandle<()> {
	tokio::spawn(async move {
		loop {
			if let Err(e) = tokio::signal::ctrl_c().await {
				warn!("Failed to listen for SIGINT: {}", e);
				break;
			}
			debug!("Received SIGINT");
			if tx.send(()).await.is_err() {
				break;
			}
		}
	})
}


// vim: ts=4
