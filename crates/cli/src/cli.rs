use std::path::PathBuf;

use clap::Parser;

/// Relay-driven device vibration bridge.
#[derive(Parser, Debug)]
#[command(name = "buzzbridge")]
#[command(about = "Discovers devices and relays websocket intensity values onto them")]
#[command(version)]
pub struct Cli {
	/// Remote server websocket address (for example
	/// wss://localhost:12345/buttplug); omit to run an embedded server
	/// in-process.
	#[arg(value_name = "ADDRESS")]
	pub address: Option<String>,

	/// Relay endpoint delivering numeric intensity frames.
	#[arg(long, value_name = "URL")]
	pub relay: Option<String>,

	/// Path to a JSON configuration file.
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Play a built-in pattern on each discovered device instead of binding
	/// the relay.
	#[arg(long, value_name = "NAME")]
	pub pattern: Option<String>,

	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

#[cfg(test)]
mod tests {
	use buzzbridge::ConnectMode;
	use clap::Parser;

	use super::*;

	#[test]
	fn address_argument_selects_remote_mode() {
		let cli = Cli::parse_from(["buzzbridge", "wss://localhost:12345/buttplug"]);
		assert_eq!(
			ConnectMode::from_address(cli.address),
			ConnectMode::Remote("wss://localhost:12345/buttplug".into())
		);
	}

	#[test]
	fn no_address_selects_embedded_mode() {
		let cli = Cli::parse_from(["buzzbridge"]);
		assert_eq!(ConnectMode::from_address(cli.address), ConnectMode::Embedded);
	}

	#[test]
	fn relay_and_pattern_flags_parse() {
		let cli = Cli::parse_from([
			"buzzbridge",
			"--relay",
			"ws://127.0.0.1:9000/",
			"--pattern",
			"burst",
			"-vv",
		]);
		assert_eq!(cli.relay.as_deref(), Some("ws://127.0.0.1:9000/"));
		assert_eq!(cli.pattern.as_deref(), Some("burst"));
		assert_eq!(cli.verbose, 2);
	}
}
