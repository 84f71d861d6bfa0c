use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Runtime configuration with compiled-in defaults.
///
/// The two hold durations are intentionally distinct: relay-driven pulses
/// hold for a full second, manual pulses for 300 ms, matching the behavior
/// this bridge replaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
	/// Name announced to the device-control server.
	pub client_name: String,
	/// Relay endpoint delivering numeric intensity frames.
	pub relay_url: String,
	/// Hold before the stop command for relay-driven pulses, in milliseconds.
	pub relay_hold_ms: u64,
	/// Hold before the stop command for manual pulses, in milliseconds.
	pub manual_hold_ms: u64,
	/// Intensity of the manual trigger.
	pub manual_intensity: f64,
	/// Factor applied to every relay-driven intensity; use to limit maximum
	/// vibration strength.
	pub vibrate_factor: f64,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			client_name: "buzzbridge".into(),
			relay_url: "ws://127.0.0.1:8765/".into(),
			relay_hold_ms: 1000,
			manual_hold_ms: 300,
			manual_intensity: 0.1,
			vibrate_factor: 1.0,
		}
	}
}

impl BridgeConfig {
	/// Loads and validates configuration from a JSON file. Absent fields
	/// keep their defaults.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&raw)?;
		config.validate()?;
		Ok(config)
	}

	pub fn relay_hold(&self) -> Duration {
		Duration::from_millis(self.relay_hold_ms)
	}

	pub fn manual_hold(&self) -> Duration {
		Duration::from_millis(self.manual_hold_ms)
	}

	fn validate(&self) -> Result<()> {
		if !(0.0..=1.0).contains(&self.manual_intensity) {
			return Err(BridgeError::Config(format!(
				"manual_intensity {} outside [0, 1]",
				self.manual_intensity
			)));
		}
		if !self.vibrate_factor.is_finite() || self.vibrate_factor < 0.0 {
			return Err(BridgeError::Config(format!(
				"vibrate_factor {} must be a non-negative number",
				self.vibrate_factor
			)));
		}
		Ok(())
	}
}
