//! Logging setup
//!
//! Progress output and the REPL own the terminal, so only warnings are shown
//! by default. `RUST_LOG` takes precedence over the verbosity flag:
//!
//! ```bash
//! RUST_LOG=webrepl=debug webrepl 192.168.4.1:/boot.py .
//! RUST_LOG=webrepl::protocol=trace webrepl 192.168.4.1
//! ```

pub use tracing::{debug, error, info, warn};

/// Default filter for a `-v` count
pub fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "info",
		_ => "debug",
	}
}

/// Initialize the tracing subscriber on stderr
pub fn init_tracing(verbosity: u8) {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(verbosity))),
		)
		.with_writer(std::io::stderr)
		.init();
}


// vim: ts=4
