use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use buzzbridge::pattern::{self, PulseStep};
use buzzbridge::{BridgeConfig, ButtplugBackend, ConnectMode, SessionController};
use clap::Parser;

mod cli;
mod console;
mod logging;

use cli::Cli;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = run(cli).await {
		// Failures surface exactly once, here.
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}

async fn run(cli: Cli) -> anyhow::Result<()> {
	let mut config = load_config(cli.config.as_deref())?;
	if let Some(relay) = cli.relay {
		config.relay_url = relay;
	}

	let pattern = resolve_pattern(cli.pattern.as_deref())?;
	let mode = ConnectMode::from_address(cli.address);

	let backend = ButtplugBackend::new(&config.client_name);
	let controller = Arc::new(
		SessionController::new(backend, config, mode, pattern).with_discovery_hook(Box::new(
			|entry| println!("{} [{}]", entry.name, entry.class),
		)),
	);

	let console = tokio::spawn(console::run(Arc::clone(&controller)));
	let result = controller.run().await;
	console.abort();
	Ok(result?)
}

fn resolve_pattern(name: Option<&str>) -> anyhow::Result<Option<Vec<PulseStep>>> {
	match name {
		Some(name) => {
			let steps = pattern::builtin(name).with_context(|| {
				format!(
					"unknown pattern {name:?}; built-ins: {}",
					pattern::builtin_names().join(", ")
				)
			})?;
			Ok(Some(steps))
		}
		None => Ok(None),
	}
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<BridgeConfig> {
	if let Some(path) = explicit {
		return BridgeConfig::load(path)
			.with_context(|| format!("loading config from {}", path.display()));
	}

	// Without an explicit flag, a config file is optional.
	let Some(dir) = dirs::config_dir() else {
		return Ok(BridgeConfig::default());
	};
	let path = dir.join("buzzbridge").join("config.json");
	if path.exists() {
		BridgeConfig::load(&path).with_context(|| format!("loading config from {}", path.display()))
	} else {
		Ok(BridgeConfig::default())
	}
}
