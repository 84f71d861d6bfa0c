//! Queue-driven vibration patterns.
//!
//! Each device gets a [`PatternPlayer`]: an unbounded queue of
//! [`PulseStep`]s drained by a background worker. Enqueueing never blocks
//! the caller on device I/O, so patterns can be stacked while one is still
//! playing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::actuator::Actuator;

/// One step of a pattern: vibrate at `intensity` for `on`, then idle `off`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseStep {
	pub intensity: f64,
	pub on: Duration,
	pub off: Duration,
}

impl PulseStep {
	pub const fn new(intensity: f64, on_ms: u64, off_ms: u64) -> Self {
		Self {
			intensity,
			on: Duration::from_millis(on_ms),
			off: Duration::from_millis(off_ms),
		}
	}
}

/// Built-in pattern names, in presentation order.
pub fn builtin_names() -> &'static [&'static str] {
	&["basic", "burst", "burst-pulse", "burst-linger", "rising"]
}

/// Looks up a built-in pattern's step table by name.
pub fn builtin(name: &str) -> Option<Vec<PulseStep>> {
	let steps = match name {
		"basic" => vec![PulseStep::new(0.7, 1300, 0)],
		"burst" => vec![PulseStep::new(0.8, 1200, 200); 3],
		"burst-pulse" => vec![PulseStep::new(0.8, 100, 100); 5],
		"burst-linger" => {
			let mut steps = vec![PulseStep::new(1.0, 700, 200); 3];
			steps.push(PulseStep::new(1.0, 1700, 200));
			steps
		}
		"rising" => {
			let mut steps = Vec::new();
			for _ in 0..3 {
				for tenth in 3..=9 {
					steps.push(PulseStep::new(f64::from(tenth) / 10.0, 100, 0));
				}
				steps.push(PulseStep::new(1.0, 300, 200));
			}
			steps
		}
		_ => return None,
	};
	Some(steps)
}

/// Background pattern playback for one device.
pub struct PatternPlayer {
	tx: mpsc::UnboundedSender<PulseStep>,
	worker: JoinHandle<()>,
	actuator: Arc<dyn Actuator>,
}

impl PatternPlayer {
	/// Spawns the worker that drains queued steps against `actuator`.
	pub fn spawn(actuator: Arc<dyn Actuator>) -> Self {
		let (tx, mut rx) = mpsc::unbounded_channel::<PulseStep>();
		let worker = tokio::spawn({
			let actuator = Arc::clone(&actuator);
			async move {
				while let Some(step) = rx.recv().await {
					if let Err(err) = actuator.vibrate(step.intensity).await {
						warn!(
							target: "buzzbridge::pattern",
							device = actuator.name(),
							error = %err,
							"pattern vibrate failed"
						);
						continue;
					}
					tokio::time::sleep(step.on).await;
					if let Err(err) = actuator.stop().await {
						warn!(
							target: "buzzbridge::pattern",
							device = actuator.name(),
							error = %err,
							"pattern stop failed"
						);
					}
					if !step.off.is_zero() {
						tokio::time::sleep(step.off).await;
					}
				}
				debug!(target: "buzzbridge::pattern", "pattern worker finished");
			}
		});
		Self {
			tx,
			worker,
			actuator,
		}
	}

	pub fn enqueue(&self, step: PulseStep) {
		let _ = self.tx.send(step);
	}

	pub fn enqueue_all(&self, steps: &[PulseStep]) {
		for step in steps {
			let _ = self.tx.send(*step);
		}
	}
}

impl Drop for PatternPlayer {
	fn drop(&mut self) {
		// The abort can land between a step's vibrate and its stop, so issue
		// a final stop to make sure the device is not left running.
		self.worker.abort();
		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			let actuator = Arc::clone(&self.actuator);
			handle.spawn(async move {
				if let Err(err) = actuator.stop().await {
					warn!(
						target: "buzzbridge::pattern",
						device = actuator.name(),
						error = %err,
						"shutdown stop failed"
					);
				}
			});
		}
	}
}

#[cfg(test)]
mod tests {
	use tokio::time::{Duration, sleep};

	use super::*;
	use crate::testutil::{Recorded, RecordingActuator};

	#[test]
	fn every_builtin_name_resolves() {
		for name in builtin_names() {
			assert!(builtin(name).is_some(), "missing pattern {name}");
		}
		assert!(builtin("nope").is_none());
	}

	#[test]
	fn burst_tables_match_recovered_shapes() {
		let burst = builtin("burst").unwrap();
		assert_eq!(burst.len(), 3);
		assert!(burst.iter().all(|s| *s == PulseStep::new(0.8, 1200, 200)));

		let linger = builtin("burst-linger").unwrap();
		assert_eq!(linger.len(), 4);
		assert_eq!(linger[3], PulseStep::new(1.0, 1700, 200));

		// Three ramps of seven ascending steps plus a peak each.
		let rising = builtin("rising").unwrap();
		assert_eq!(rising.len(), 24);
		assert_eq!(rising[0], PulseStep::new(0.3, 100, 0));
		assert_eq!(rising[7], PulseStep::new(1.0, 300, 200));
	}

	#[tokio::test(start_paused = true)]
	async fn player_drains_steps_in_order() {
		let actuator = RecordingActuator::new("toy");
		let player = PatternPlayer::spawn(actuator.clone());
		player.enqueue(PulseStep::new(0.8, 100, 100));
		player.enqueue(PulseStep::new(0.4, 50, 0));

		// First step: 100ms on, 100ms off; second: 50ms on.
		sleep(Duration::from_millis(300)).await;
		assert_eq!(
			actuator.commands(),
			vec![
				Recorded::Vibrate(0.8),
				Recorded::Stop,
				Recorded::Vibrate(0.4),
				Recorded::Stop,
			]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn idle_gap_separates_steps() {
		let actuator = RecordingActuator::new("toy");
		let player = PatternPlayer::spawn(actuator.clone());
		player.enqueue_all(&[PulseStep::new(0.8, 100, 100), PulseStep::new(0.4, 50, 0)]);

		sleep(Duration::from_millis(150)).await;
		// Inside the first step's off gap: second vibrate not yet issued.
		assert_eq!(
			actuator.commands(),
			vec![Recorded::Vibrate(0.8), Recorded::Stop]
		);
	}

	#[tokio::test(start_paused = true)]
	async fn dropping_the_player_mid_step_still_stops_the_device() {
		let actuator = RecordingActuator::new("toy");
		let player = PatternPlayer::spawn(actuator.clone());
		player.enqueue(PulseStep::new(0.8, 1000, 0));

		// Let the vibrate go out, then tear the player down mid-hold.
		sleep(Duration::from_millis(10)).await;
		assert_eq!(actuator.commands(), vec![Recorded::Vibrate(0.8)]);
		drop(player);

		sleep(Duration::from_millis(1)).await;
		assert_eq!(
			actuator.commands(),
			vec![Recorded::Vibrate(0.8), Recorded::Stop]
		);
	}
}
