//! Shared test doubles.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::actuator::Actuator;
use crate::error::{BridgeError, Result};

/// Command observed by a [`RecordingActuator`], with the paused-clock
/// instant it was issued at.
#[derive(Clone, Debug, PartialEq)]
pub enum Recorded {
	Vibrate(f64),
	Stop,
}

/// [`Actuator`] that records every command instead of talking to hardware.
pub struct RecordingActuator {
	name: String,
	log: Arc<Mutex<Vec<(Recorded, Instant)>>>,
	fail_vibrate: bool,
}

impl RecordingActuator {
	pub fn new(name: &str) -> Arc<Self> {
		Arc::new(Self {
			name: name.to_string(),
			log: Arc::new(Mutex::new(Vec::new())),
			fail_vibrate: false,
		})
	}

	/// Variant whose vibrate command always fails at the send step.
	pub fn failing(name: &str) -> Arc<Self> {
		Arc::new(Self {
			name: name.to_string(),
			log: Arc::new(Mutex::new(Vec::new())),
			fail_vibrate: true,
		})
	}

	pub fn commands(&self) -> Vec<Recorded> {
		self.log.lock().iter().map(|(cmd, _)| cmd.clone()).collect()
	}

	pub fn timeline(&self) -> Vec<(Recorded, Instant)> {
		self.log.lock().clone()
	}
}

impl Actuator for RecordingActuator {
	fn name(&self) -> &str {
		&self.name
	}

	fn vibrate(&self, speed: f64) -> BoxFuture<'static, Result<()>> {
		let log = Arc::clone(&self.log);
		let fail = self.fail_vibrate;
		Box::pin(async move {
			if fail {
				return Err(BridgeError::Embedded("simulated send failure".into()));
			}
			log.lock().push((Recorded::Vibrate(speed), Instant::now()));
			Ok(())
		})
	}

	fn stop(&self) -> BoxFuture<'static, Result<()>> {
		let log = Arc::clone(&self.log);
		Box::pin(async move {
			log.lock().push((Recorded::Stop, Instant::now()));
			Ok(())
		})
	}
}
