//! Narrow command seam over a discovered device.
//!
//! Bindings, patterns, and the manual trigger all drive devices through
//! [`Actuator`] so tests can substitute a recording implementation for the
//! client-library handle.

use std::sync::Arc;

use buttplug::client::{ButtplugClientDevice, ScalarValueCommand};
use futures_util::future::BoxFuture;

use crate::error::{BridgeError, Result};

/// The two commands the bridge ever issues to a device.
pub trait Actuator: Send + Sync {
	fn name(&self) -> &str;

	/// Sets vibration intensity. Resolves when the send completes, not when
	/// the device acknowledges.
	fn vibrate(&self, speed: f64) -> BoxFuture<'static, Result<()>>;

	/// Stops all actuators on the device.
	fn stop(&self) -> BoxFuture<'static, Result<()>>;
}

/// [`Actuator`] backed by a client-library device handle.
pub struct ButtplugActuator {
	device: Arc<ButtplugClientDevice>,
}

impl ButtplugActuator {
	pub fn new(device: Arc<ButtplugClientDevice>) -> Self {
		Self { device }
	}
}

impl Actuator for ButtplugActuator {
	fn name(&self) -> &str {
		self.device.name()
	}

	fn vibrate(&self, speed: f64) -> BoxFuture<'static, Result<()>> {
		let fut = self.device.vibrate(&ScalarValueCommand::ScalarValue(speed));
		Box::pin(async move { fut.await.map_err(BridgeError::Command) })
	}

	fn stop(&self) -> BoxFuture<'static, Result<()>> {
		let fut = self.device.stop();
		Box::pin(async move { fut.await.map_err(BridgeError::Command) })
	}
}
