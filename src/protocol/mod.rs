//! WebREPL wire protocol
//!
//! Layers, bottom up: the reduced websocket framing (`frame`), the HTTP
//! upgrade (`handshake`), the websocket-like transport seam (`traits`,
//! `websocket`) and the file request records (`request`).
//!
//! # Example Usage
//!
//! ```ignore
//! use webrepl::protocol::{perform_handshake, FrameCodec};
//!
//! let mut stream = tokio::net::TcpStream::connect(("192.168.4.1", 8266)).await?;
//! perform_handshake(&mut stream, "192.168.4.1", true).await?;
//! let codec = FrameCodec::new(stream);
//! ```

pub mod error;
pub mod frame;
pub mod handshake;
pub mod request;
pub mod traits;
pub mod websocket;

// Re-export public API
pub use error::ProtocolError;
pub use frame::{encode_frame, Frame, FrameReader, FrameWriter, Opcode};
pub use handshake::perform_handshake;
pub use request::{DeviceVersion, FileRequest, Operation, TransferResponse};
pub use traits::{ProtocolResult, WebSocketTransport};
pub use websocket::FrameCodec;

// vim: ts=4
