//! Timed vibrate/stop command pairs.
//!
//! A vibrate command is never issued without a scheduled stop. The stop
//! timer is armed only after the start command's send completes, and once
//! armed it cannot be cancelled.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::actuator::Actuator;
use crate::error::Result;

/// Scales a relay intensity by `factor` and clamps it to the device range.
pub fn scale_intensity(raw: f64, factor: f64) -> f64 {
	(raw * factor).clamp(0.0, 1.0)
}

/// Issues a vibrate command and arms a detached stop after `hold`.
///
/// Returns once the start command's send has resolved; the stop fires from a
/// background task. A failed stop is logged and dropped, matching the
/// fire-and-forget behavior of the rest of the command path.
pub async fn pulse(actuator: Arc<dyn Actuator>, intensity: f64, hold: Duration) -> Result<()> {
	actuator.vibrate(intensity).await?;
	tokio::spawn(async move {
		tokio::time::sleep(hold).await;
		if let Err(err) = actuator.stop().await {
			warn!(
				target: "buzzbridge::pulse",
				device = actuator.name(),
				error = %err,
				"stop command failed"
			);
		}
	});
	Ok(())
}
