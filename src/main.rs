use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use std::path::Path;
use tokio::net::TcpStream;

use webrepl::callbacks::{NoProgressCallback, ProgressCallback};
use webrepl::config::Config;
use webrepl::error::{Result, WebReplError};
use webrepl::logging::{info, init_tracing};
use webrepl::progress::CliProgressCallback;
use webrepl::protocol::FrameCodec;
use webrepl::repl::run_interactive;
use webrepl::session::WebReplSession;
use webrepl::target::{parse_command, Command};
use webrepl::transfer::{get_file_until, put_file, TransferOptions};
use webrepl::utils::{read_password, wait_for_termination};

///////////////////////
// Utility functions //
///////////////////////

fn cli() -> ClapCommand {
	ClapCommand::new("webrepl")
		.version(env!("CARGO_PKG_VERSION"))
		.about("MicroPython WebREPL client")
		.after_help(
			"Examples:\n  \
			 webrepl 192.168.4.1                      interactive REPL\n  \
			 webrepl 192.168.4.1:/boot.py .           download\n  \
			 webrepl main.py 192.168.4.1:8266:/main.py upload",
		)
		.arg(
			Arg::new("password")
				.short('p')
				.long("password")
				.value_name("PASSWORD")
				.help("Device password (prompted for when not configured)"),
		)
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Config file (default: ~/.config/webrepl/config.toml)"),
		)
		.arg(
			Arg::new("quiet")
				.short('q')
				.long("quiet")
				.action(ArgAction::SetTrue)
				.help("Do not show transfer progress"),
		)
		.arg(
			Arg::new("verbose")
				.short('v')
				.long("verbose")
				.action(ArgAction::Count)
				.help("More logging (-v info, -vv debug)"),
		)
		.arg(
			Arg::new("source")
				.required(true)
				.value_name("SRC")
				.help("host[:port] for a REPL, host[:port]:path or a local file"),
		)
		.arg(Arg::new("destination").value_name("DST").help("Local file or host[:port]:path"))
}

fn resolve_password(matches: &ArgMatches, config: &Config) -> Result<String> {
	if let Some(password) = matches.get_one::<String>("password") {
		return Ok(password.clone());
	}
	if let Some(password) = &config.password {
		return Ok(password.clone());
	}
	Ok(read_password("Password: ")?)
}

fn progress_callback(matches: &ArgMatches, config: &Config) -> Box<dyn ProgressCallback> {
	if config.transfer.show_progress && !matches.get_flag("quiet") {
		Box::new(CliProgressCallback::new())
	} else {
		Box::new(NoProgressCallback)
	}
}

/// Connect for a file transfer and report the firmware version
async fn open_transfer_session(
	host: &str,
	port: u16,
	password: &str,
	config: &Config,
) -> Result<WebReplSession<FrameCodec<TcpStream>>> {
	let mut session = WebReplSession::connect(host, port, password, &config.connection).await?;
	session.enable_binary_mode()?;
	let version = session.get_version().await?;
	info!("Remote WebREPL version: {}", version);
	Ok(session)
}

async fn run(matches: &ArgMatches) -> Result<()> {
	let config = Config::load(matches.get_one::<String>("config").map(Path::new))?;
	let source = matches
		.get_one::<String>("source")
		.ok_or_else(|| WebReplError::InvalidTarget { message: "source argument required".to_string() })?;
	let destination = matches.get_one::<String>("destination").map(|s| s.as_str());
	let command = parse_command(source, destination, config.port)?;
	let password = resolve_password(matches, &config)?;
	let options = TransferOptions::from(&config.transfer);

	match command {
		Command::Repl { host, port } => {
			let session = WebReplSession::connect(&host, port, &password, &config.connection).await?;
			eprintln!("Connected to {}:{}, type \"exit\" to leave", host, port);
			run_interactive(session.into_transport()).await
		}
		Command::Put { local, remote } => {
			let mut session = open_transfer_session(&remote.host, remote.port, &password, &config).await?;
			let progress = progress_callback(matches, &config);
			info!("{} -> {}", local.display(), remote);
			tokio::select! {
				result = put_file(&mut session, &local, &remote.path, &options, progress.as_ref()) => result?,
				signal = wait_for_termination() => return Err(WebReplError::Interrupted(signal)),
			};
			session.close().await?;
			Ok(())
		}
		Command::Get { remote, local } => {
			let mut session = open_transfer_session(&remote.host, remote.port, &password, &config).await?;
			let progress = progress_callback(matches, &config);
			info!("{} -> {}", remote, local.display());
			let stop = wait_for_termination();
			get_file_until(&mut session, &remote.path, &local, &options, progress.as_ref(), stop).await?;
			session.close().await?;
			Ok(())
		}
	}
}

#[tokio::main]
async fn main() {
	let matches = cli().get_matches();
	init_tracing(matches.get_count("verbose"));

	match run(&matches).await {
		Ok(()) => {}
		Err(WebReplError::Interrupted(signal)) => std::process::exit(signal.exit_code()),
		Err(e) => {
			eprintln!("Error: {}", e);
			std::process::exit(1);
		}
	}
}

// vim: ts=4
