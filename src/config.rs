//! Configuration for the WebREPL client
//!
//! Priority chain, lowest first:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (~/.config/webrepl/config.toml, or an explicit .toml/.json path)
//! 3. Environment variables (WEBREPL_* prefix)
//! 4. CLI flags, applied by the caller

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::WebReplError;
use crate::protocol::frame::{DEFAULT_MAX_SKIPPED_FRAMES, MAX_PAYLOAD_LEN};

/// Port the WebREPL server listens on
pub const DEFAULT_PORT: u16 = 8266;

/// PUT chunk size used by the reference client
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Device port
	pub port: u16,

	/// Device password; prompted for when absent
	pub password: Option<String>,

	/// Transport settings
	pub connection: ConnectionConfig,

	/// File transfer settings
	pub transfer: TransferConfig,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			port: DEFAULT_PORT,
			password: None,
			connection: ConnectionConfig::default(),
			transfer: TransferConfig::default(),
		}
	}
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
	/// Timeout for a single TCP connect attempt in milliseconds
	pub connect_timeout_ms: u64,

	/// Number of connect attempts before giving up
	pub retry_count: u32,

	/// Delay between attempts in milliseconds
	pub retry_delay_ms: u64,

	/// Require a 101 status on the HTTP upgrade
	pub strict_handshake: bool,

	/// Consecutive non-data frames tolerated per read
	pub max_skipped_frames: usize,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		ConnectionConfig {
			connect_timeout_ms: 2000,
			retry_count: 5,
			retry_delay_ms: 500,
			strict_handshake: true,
			max_skipped_frames: DEFAULT_MAX_SKIPPED_FRAMES,
		}
	}
}

/// File transfer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransferConfig {
	/// Bytes per PUT frame
	pub chunk_size: usize,

	/// Remote directory prefix prepended to every remote path
	pub sandbox: String,

	/// Render progress on stderr
	pub show_progress: bool,
}

impl Default for TransferConfig {
	fn default() -> Self {
		TransferConfig { chunk_size: DEFAULT_CHUNK_SIZE, sandbox: String::new(), show_progress: true }
	}
}

impl Config {
	/// Default config file location
	pub fn default_path() -> Option<PathBuf> {
		std::env::var("HOME")
			.ok()
			.map(|home| PathBuf::from(home).join(".config").join("webrepl").join("config.toml"))
	}

	/// Parse a TOML document
	pub fn from_toml_str(contents: &str) -> Result<Self, WebReplError> {
		toml::from_str(contents)
			.map_err(|e| WebReplError::InvalidConfig { message: e.to_string() })
	}

	/// Load defaults, then the config file, then the environment
	///
	/// An explicit path must exist; the default path is optional.
	pub fn load(explicit: Option<&Path>) -> Result<Self, WebReplError> {
		let mut config = match explicit {
			Some(path) => Self::from_file(path)?,
			None => match Self::default_path() {
				Some(path) if path.exists() => Self::from_file(&path)?,
				_ => Config::default(),
			},
		};
		config.apply_env(|key| std::env::var(key).ok())?;
		config.validate()?;
		Ok(config)
	}

	fn from_file(path: &Path) -> Result<Self, WebReplError> {
		debug!("Loading config from {}", path.display());
		let contents = std::fs::read_to_string(path).map_err(|e| WebReplError::InvalidConfig {
			message: format!("cannot read {}: {}", path.display(), e),
		})?;
		if path.extension().map_or(false, |ext| ext == "json") {
			serde_json::from_str(&contents)
				.map_err(|e| WebReplError::InvalidConfig { message: e.to_string() })
		} else {
			Self::from_toml_str(&contents)
		}
	}

	/// Apply WEBREPL_* overrides from `lookup`
	pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), WebReplError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(password) = lookup("WEBREPL_PASSWORD") {
			self.password = Some(password);
		}
		if let Some(port) = lookup("WEBREPL_PORT") {
			self.port = port.trim().parse().map_err(|_| WebReplError::InvalidConfig {
				message: format!("WEBREPL_PORT is not a port number: {}", port),
			})?;
		}
		if let Some(sandbox) = lookup("WEBREPL_SANDBOX") {
			self.transfer.sandbox = sandbox;
		}
		Ok(())
	}

	/// Reject settings the protocol cannot honour
	pub fn validate(&self) -> Result<(), WebReplError> {
		let invalid = |message: &str| Err(WebReplError::InvalidConfig { message: message.to_string() });
		if self.port == 0 {
			return invalid("port must be nonzero");
		}
		if self.transfer.chunk_size == 0 || self.transfer.chunk_size > MAX_PAYLOAD_LEN {
			return invalid("chunkSize must be between 1 and 65535");
		}
		if self.connection.retry_count == 0 {
			return invalid("retryCount must be at least 1");
		}
		if self.connection.max_skipped_frames == 0 {
			return invalid("maxSkippedFrames must be at least 1");
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert_eq!(config.port, 8266);
		assert!(config.password.is_none());
		assert_eq!(config.transfer.chunk_size, 1024);
		assert!(config.connection.strict_handshake);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_partial_toml_keeps_defaults() {
		let config = Config::from_toml_str(
			r#"
			port = 8300

			[transfer]
			sandbox = "/tmp/webrepl/"
			"#,
		)
		.unwrap();
		assert_eq!(config.port, 8300);
		assert_eq!(config.transfer.sandbox, "/tmp/webrepl/");
		assert_eq!(config.transfer.chunk_size, 1024);
		assert_eq!(config.connection.retry_count, 5);
	}

	#[test]
	fn test_env_overrides() {
		let mut config = Config::default();
		config
			.apply_env(|key| match key {
				"WEBREPL_PASSWORD" => Some("secret".to_string()),
				"WEBREPL_PORT" => Some("9000".to_string()),
				_ => None,
			})
			.unwrap();
		assert_eq!(config.password.as_deref(), Some("secret"));
		assert_eq!(config.port, 9000);

		let bad = config.apply_env(|key| {
			if key == "WEBREPL_PORT" {
				Some("nope".to_string())
			} else {
				None
			}
		});
		assert!(bad.is_err());
	}

	#[test]
	fn test_validate_rejects_oversized_chunks() {
		let mut config = Config::default();
		config.transfer.chunk_size = 70_000;
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_config_serialization() {
		let config = Config::default();
		let json = serde_json::to_string(&config).expect("Failed to serialize");
		assert!(json.contains("\"strictHandshake\":true"));
		let deserialized: Config = serde_json::from_str(&json).expect("Failed to deserialize");
		assert_eq!(config.port, deserialized.port);
	}
}

// vim: ts=4
