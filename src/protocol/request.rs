//! File request header and response record
//!
//! Request layout, little-endian (`<2sBBQLH64s`), 82 bytes:
//!
//! ```text
//! 0   2  magic "WA"
//! 2   1  operation
//! 3   1  reserved
//! 4   8  reserved
//! 12  4  file size (PUT only)
//! 16  2  file name length
//! 18  64 file name, zero padded
//! ```
//!
//! Responses are "WB" followed by a u16 status; zero means success.

use std::fmt;

use super::error::ProtocolError;
use super::traits::ProtocolResult;

pub const REQUEST_MAGIC: &[u8; 2] = b"WA";
pub const RESPONSE_MAGIC: &[u8; 2] = b"WB";

pub const REQUEST_HEADER_LEN: usize = 82;
pub const RESPONSE_LEN: usize = 4;

/// Width of the file name field
pub const MAX_FILENAME_LEN: usize = 64;

const SIZE_OFFSET: usize = 12;
const NAME_LEN_OFFSET: usize = 16;
const NAME_OFFSET: usize = 18;

/// File request operation code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Operation {
	Put = 1,
	Get = 2,
	GetVersion = 3,
}

impl Operation {
	pub fn code(self) -> u8 {
		self as u8
	}

	pub fn from_code(code: u8) -> Option<Self> {
		match code {
			1 => Some(Operation::Put),
			2 => Some(Operation::Get),
			3 => Some(Operation::GetVersion),
			_ => None,
		}
	}
}

/// A validated file request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
	operation: Operation,
	file_size: u32,
	file_name: Vec<u8>,
}

impl FileRequest {
	/// Validate and build a request
	///
	/// Names longer than the fixed field and sizes above `u32::MAX` are
	/// rejected here, before anything reaches the wire.
	pub fn new(operation: Operation, file_size: u64, file_name: &[u8]) -> ProtocolResult<Self> {
		if file_name.len() > MAX_FILENAME_LEN {
			return Err(ProtocolError::NameTooLong { len: file_name.len(), max: MAX_FILENAME_LEN });
		}
		if file_size > u64::from(u32::MAX) {
			return Err(ProtocolError::FileTooLarge { size: file_size });
		}
		let file_size = if operation == Operation::Put { file_size as u32 } else { 0 };
		Ok(Self { operation, file_size, file_name: file_name.to_vec() })
	}

	pub fn put(file_name: &[u8], file_size: u64) -> ProtocolResult<Self> {
		Self::new(Operation::Put, file_size, file_name)
	}

	pub fn get(file_name: &[u8]) -> ProtocolResult<Self> {
		Self::new(Operation::Get, 0, file_name)
	}

	pub fn get_version() -> Self {
		Self { operation: Operation::GetVersion, file_size: 0, file_name: Vec::new() }
	}

	pub fn operation(&self) -> Operation {
		self.operation
	}

	pub fn file_size(&self) -> u32 {
		self.file_size
	}

	pub fn file_name(&self) -> &[u8] {
		&self.file_name
	}

	pub fn encode(&self) -> [u8; REQUEST_HEADER_LEN] {
		let mut rec = [0u8; REQUEST_HEADER_LEN];
		rec[0..2].copy_from_slice(REQUEST_MAGIC);
		rec[2] = self.operation.code();
		rec[SIZE_OFFSET..NAME_LEN_OFFSET].copy_from_slice(&self.file_size.to_le_bytes());
		rec[NAME_LEN_OFFSET..NAME_OFFSET]
			.copy_from_slice(&(self.file_name.len() as u16).to_le_bytes());
		rec[NAME_OFFSET..NAME_OFFSET + self.file_name.len()].copy_from_slice(&self.file_name);
		rec
	}

	/// Parse a header (the device side of the exchange)
	pub fn decode(rec: &[u8]) -> ProtocolResult<Self> {
		if rec.len() != REQUEST_HEADER_LEN {
			return Err(ProtocolError::ProtocolViolation(format!(
				"request header is {} bytes, expected {}",
				rec.len(),
				REQUEST_HEADER_LEN
			)));
		}
		if &rec[0..2] != REQUEST_MAGIC {
			return Err(ProtocolError::ProtocolViolation(format!(
				"bad request signature {}",
				hex::encode(&rec[0..2])
			)));
		}
		let operation = Operation::from_code(rec[2]).ok_or_else(|| {
			ProtocolError::ProtocolViolation(format!("unknown operation {}", rec[2]))
		})?;
		let file_size = u32::from_le_bytes([rec[12], rec[13], rec[14], rec[15]]);
		let name_len = u16::from_le_bytes([rec[16], rec[17]]) as usize;
		if name_len > MAX_FILENAME_LEN {
			return Err(ProtocolError::NameTooLong { len: name_len, max: MAX_FILENAME_LEN });
		}
		Ok(Self { operation, file_size, file_name: rec[NAME_OFFSET..NAME_OFFSET + name_len].to_vec() })
	}
}

/// Status record sent by the device after a request and after the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferResponse {
	pub status: u16,
}

impl TransferResponse {
	pub fn success() -> Self {
		Self { status: 0 }
	}

	/// Parse the 4-byte record; a bad signature is a protocol violation
	pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
		if data.len() != RESPONSE_LEN {
			return Err(ProtocolError::ProtocolViolation(format!(
				"response is {} bytes, expected {}",
				data.len(),
				RESPONSE_LEN
			)));
		}
		if &data[0..2] != RESPONSE_MAGIC {
			return Err(ProtocolError::ProtocolViolation(format!(
				"bad response signature {}",
				hex::encode(&data[0..2])
			)));
		}
		Ok(Self { status: u16::from_le_bytes([data[2], data[3]]) })
	}

	pub fn encode(&self) -> [u8; RESPONSE_LEN] {
		let status = self.status.to_le_bytes();
		[RESPONSE_MAGIC[0], RESPONSE_MAGIC[1], status[0], status[1]]
	}

	pub fn is_success(&self) -> bool {
		self.status == 0
	}

	/// Turn a nonzero status into an error
	pub fn ensure_success(self) -> ProtocolResult<()> {
		if self.is_success() {
			Ok(())
		} else {
			Err(ProtocolError::UnexpectedStatus { status: self.status })
		}
	}
}

/// Device firmware version returned by GET_VERSION
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceVersion {
	pub major: u8,
	pub minor: u8,
	pub patch: u8,
}

impl DeviceVersion {
	pub fn from_bytes(bytes: &[u8]) -> ProtocolResult<Self> {
		match bytes {
			[major, minor, patch] => Ok(Self { major: *major, minor: *minor, patch: *patch }),
			_ => Err(ProtocolError::ProtocolViolation(format!(
				"version reply is {} bytes, expected 3",
				bytes.len()
			))),
		}
	}
}

impl fmt::Display for DeviceVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_put_header_layout() {
		let rec = FileRequest::put(b"/main.py", 0x0102_0304).unwrap().encode();
		assert_eq!(&rec[0..2], b"WA");
		assert_eq!(rec[2], 1);
		assert_eq!(rec[3], 0);
		assert!(rec[4..12].iter().all(|&b| b == 0));
		assert_eq!(&rec[12..16], &[0x04, 0x03, 0x02, 0x01]);
		assert_eq!(&rec[16..18], &[8, 0]);
		assert_eq!(&rec[18..26], b"/main.py");
		assert!(rec[26..].iter().all(|&b| b == 0));
	}

	#[test]
	fn test_get_ignores_size() {
		let req = FileRequest::new(Operation::Get, 99, b"boot.py").unwrap();
		assert_eq!(req.file_size(), 0);
		assert_eq!(req.encode()[2], 2);
	}

	#[test]
	fn test_version_request_is_bare() {
		let rec = FileRequest::get_version().encode();
		assert_eq!(&rec[0..3], &[b'W', b'A', 3]);
		assert!(rec[3..].iter().all(|&b| b == 0));
	}

	#[test]
	fn test_name_length_limit() {
		let name = vec![b'a'; MAX_FILENAME_LEN];
		assert!(FileRequest::get(&name).is_ok());

		let name = vec![b'a'; MAX_FILENAME_LEN + 1];
		assert!(matches!(
			FileRequest::get(&name),
			Err(ProtocolError::NameTooLong { len: 65, max: 64 })
		));
	}

	#[test]
	fn test_size_limit() {
		assert!(FileRequest::put(b"x", u64::from(u32::MAX)).is_ok());
		assert!(matches!(
			FileRequest::put(b"x", u64::from(u32::MAX) + 1),
			Err(ProtocolError::FileTooLarge { .. })
		));
	}

	#[test]
	fn test_decode_matches_encode() {
		let req = FileRequest::put(b"/lib/x.py", 1234).unwrap();
		assert_eq!(FileRequest::decode(&req.encode()).unwrap(), req);
	}

	#[test]
	fn test_response_signature_checked() {
		assert_eq!(TransferResponse::decode(b"WB\x00\x00").unwrap(), TransferResponse::success());
		assert_eq!(TransferResponse::decode(b"WB\x02\x01").unwrap().status, 0x0102);
		assert!(matches!(
			TransferResponse::decode(b"XB\x00\x00"),
			Err(ProtocolError::ProtocolViolation(_))
		));
	}

	#[test]
	fn test_nonzero_status_is_error() {
		let resp = TransferResponse { status: 1 };
		assert!(matches!(resp.ensure_success(), Err(ProtocolError::UnexpectedStatus { status: 1 })));
	}

	#[test]
	fn test_device_version_display() {
		let v = DeviceVersion::from_bytes(&[1, 19, 1]).unwrap();
		assert_eq!(v.to_string(), "1.19.1");
		assert!(DeviceVersion::from_bytes(&[1, 2]).is_err());
	}
}

// vim: ts=4
