//! Interactive console, the terminal stand-in for the original page UI.

use std::sync::Arc;

use buzzbridge::pattern;
use buzzbridge::session::{ControlBackend, SessionController};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Reads operator commands from stdin until EOF.
///
/// An empty line pulses every vibrate-capable device at the fixed manual
/// intensity; `list` reprints the roster; a pattern name queues that
/// pattern; `quit` exits.
pub async fn run<B: ControlBackend>(controller: Arc<SessionController<B>>) {
	let stdin = BufReader::new(tokio::io::stdin());
	let mut lines = stdin.lines();

	while let Ok(Some(line)) = lines.next_line().await {
		match line.trim() {
			"" => {
				let pulsed = controller.pulse_all().await;
				if pulsed == 0 {
					println!("no vibrate-capable devices yet");
				} else {
					debug!(target: "buzzbridge", pulsed, "manual pulse");
				}
			}
			"list" => {
				let roster = controller.roster();
				if roster.is_empty() {
					println!("no devices discovered yet");
				}
				for entry in roster {
					println!("{} [{}]", entry.name, entry.class);
				}
			}
			"quit" | "exit" => std::process::exit(0),
			name => {
				if !controller.play_pattern(name) {
					println!(
						"unknown command or pattern {name:?}; patterns: {}",
						pattern::builtin_names().join(", ")
					);
				}
			}
		}
	}
}
