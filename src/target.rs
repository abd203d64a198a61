//! Command-line targets
//!
//! An argument is remote when it names a host before a colon and does not
//! look like a local path (`/`, `.` or `~` prefix). Accepted forms:
//! `host`, `host:port`, `host:path` and `host:port:path`.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, WebReplError};

/// A file on the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
	pub host: String,
	pub port: u16,
	pub path: String,
}

impl fmt::Display for RemoteLocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}:{}", self.host, self.port, self.path)
	}
}

/// What the command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Download `remote` into `local`
	Get { remote: RemoteLocation, local: PathBuf },
	/// Upload `local` to `remote`
	Put { local: PathBuf, remote: RemoteLocation },
	/// Interactive session
	Repl { host: String, port: u16 },
}

fn invalid(message: String) -> WebReplError {
	WebReplError::InvalidTarget { message }
}

/// Whether an argument names a device location
pub fn is_remote(arg: &str) -> bool {
	if arg.starts_with('/') || arg.starts_with('.') || arg.starts_with('~') {
		return false;
	}
	matches!(arg.find(':'), Some(pos) if pos > 0)
}

fn parse_port(s: &str, arg: &str) -> Result<u16> {
	match s.parse::<u16>() {
		Ok(port) if port > 0 => Ok(port),
		_ => Err(invalid(format!("bad port '{}' in '{}'", s, arg))),
	}
}

/// Split `host[:port]`
pub fn parse_host(arg: &str, default_port: u16) -> Result<(String, u16)> {
	let (host, port) = match arg.split_once(':') {
		Some((host, port)) => (host, parse_port(port, arg)?),
		None => (arg, default_port),
	};
	if host.is_empty() {
		return Err(invalid(format!("missing host in '{}'", arg)));
	}
	Ok((host.to_string(), port))
}

/// Parse `host[:port]:path`; an empty path means `/`
pub fn parse_remote(arg: &str, default_port: u16) -> Result<RemoteLocation> {
	let (host_part, path) =
		arg.rsplit_once(':').ok_or_else(|| invalid(format!("'{}' is not host:path", arg)))?;
	let (host, port) = parse_host(host_part, default_port)?;
	let path = if path.is_empty() { "/".to_string() } else { path.to_string() };
	Ok(RemoteLocation { host, port, path })
}

/// Last component of a remote path
pub fn remote_basename(path: &str) -> &str {
	path.rsplit('/').next().unwrap_or(path)
}

/// Local file a download ends up in
///
/// An existing directory receives the remote basename.
pub fn local_destination(local: &Path, remote_path: &str) -> Result<PathBuf> {
	if !local.is_dir() {
		return Ok(local.to_path_buf());
	}
	match remote_basename(remote_path) {
		"" => Err(invalid(format!("cannot name a local file after '{}'", remote_path))),
		name => Ok(local.join(name)),
	}
}

/// Remote path an upload ends up at
///
/// A path ending in `/` receives the local basename.
pub fn remote_destination(remote_path: &str, local: &Path) -> Result<String> {
	if !remote_path.ends_with('/') {
		return Ok(remote_path.to_string());
	}
	let name = local
		.file_name()
		.and_then(|n| n.to_str())
		.ok_or_else(|| invalid(format!("cannot name a remote file after '{}'", local.display())))?;
	Ok(format!("{}{}", remote_path, name))
}

/// Turn the positional arguments into a command
pub fn parse_command(source: &str, destination: Option<&str>, default_port: u16) -> Result<Command> {
	let destination = match destination {
		None => {
			let (host, port) = parse_host(source, default_port)?;
			return Ok(Command::Repl { host, port });
		}
		Some(d) => d,
	};

	match (is_remote(source), is_remote(destination)) {
		(true, false) => {
			let remote = parse_remote(source, default_port)?;
			let local = local_destination(Path::new(destination), &remote.path)?;
			Ok(Command::Get { remote, local })
		}
		(false, true) => {
			let local = PathBuf::from(source);
			let mut remote = parse_remote(destination, default_port)?;
			remote.path = remote_destination(&remote.path, &local)?;
			Ok(Command::Put { local, remote })
		}
		(true, true) => Err(invalid("device-to-device copy is not supported".to_string())),
		(false, false) => Err(invalid("one of the arguments must be host:path".to_string())),
	}
}


// vim: ts=4
