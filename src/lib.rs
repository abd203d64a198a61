//! # WebREPL - MicroPython WebREPL client
//!
//! Transfers files to and from a MicroPython device and drives its REPL over
//! the WebREPL protocol: a reduced websocket framing on a plain TCP stream,
//! a password prompt login, an 82-byte file request header and a chunked
//! download stream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use webrepl::config::ConnectionConfig;
//! use webrepl::callbacks::NoProgressCallback;
//! use webrepl::session::WebReplSession;
//! use webrepl::transfer::{put_file, TransferOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConnectionConfig::default();
//!     let mut session = WebReplSession::connect("192.168.4.1", 8266, "secret", &config).await?;
//!     session.enable_binary_mode()?;
//!     println!("MicroPython {}", session.get_version().await?);
//!     put_file(
//!         &mut session,
//!         "main.py".as_ref(),
//!         "/main.py",
//!         &TransferOptions::default(),
//!         &NoProgressCallback,
//!     )
//!     .await?;
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod protocol;
pub mod repl;
pub mod session;
pub mod target;
pub mod transfer;
pub mod utils;

// Re-export commonly used types and functions
pub use config::Config;
pub use error::{ConnectionError, Result, WebReplError};
pub use protocol::{DeviceVersion, FrameCodec, ProtocolError, WebSocketTransport};
pub use session::WebReplSession;
pub use target::Command;

// vim: ts=4
