/// What a discovered device can do, as far as the bridge cares.
///
/// The backend reports a full command surface per device; the bridge only
/// distinguishes "has at least one vibration actuator" from everything else.
/// Devices classified as [`DeviceClass::Other`] are listed but never driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceClass {
	/// One or more vibration actuators.
	Vibrate { actuators: u32 },
	/// No vibration support.
	Other,
}

impl DeviceClass {
	/// Classifies a device by its reported vibration actuator count.
	pub fn from_vibrate_actuators(count: usize) -> Self {
		if count == 0 {
			DeviceClass::Other
		} else {
			DeviceClass::Vibrate {
				actuators: count as u32,
			}
		}
	}

	pub fn is_vibrate(&self) -> bool {
		matches!(self, DeviceClass::Vibrate { .. })
	}
}

impl std::fmt::Display for DeviceClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DeviceClass::Vibrate { .. } => write!(f, "vibrate"),
			DeviceClass::Other => write!(f, "other"),
		}
	}
}
