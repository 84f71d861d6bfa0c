//! Session orchestration: connect, scan, and bind discovered devices.
//!
//! The controller drives one linear sequence: subscribe to backend events,
//! connect (embedded or remote), start the relay listener, start scanning,
//! then dispatch discovery events until the backend disconnects. Devices
//! with vibration support get a relay binding (or a pattern, when one was
//! requested) plus the manual trigger; everything else is only listed.

use std::sync::Arc;

use buttplug::client::{ButtplugClient, ButtplugClientEvent};
use buttplug::core::connector::{ButtplugInProcessClientConnectorBuilder, new_json_ws_client_connector};
use buttplug::server::ButtplugServerBuilder;
use futures_util::future::BoxFuture;
use futures_util::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::actuator::{Actuator, ButtplugActuator};
use crate::capability::DeviceClass;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::pattern::{PatternPlayer, PulseStep};
use crate::pulse::{pulse, scale_intensity};
use crate::relay::RelayListener;

/// How the session reaches its device-control backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectMode {
	/// Server hosted in-process. Which device transports it offers is a
	/// compile-time property of the client library, not of this crate.
	Embedded,
	/// Remote server at a websocket address.
	Remote(String),
}

impl ConnectMode {
	/// Address present selects remote mode; absence selects embedded mode.
	pub fn from_address(address: Option<String>) -> Self {
		match address {
			Some(address) => ConnectMode::Remote(address),
			None => ConnectMode::Embedded,
		}
	}
}

impl std::fmt::Display for ConnectMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ConnectMode::Embedded => write!(f, "embedded"),
			ConnectMode::Remote(address) => write!(f, "remote({address})"),
		}
	}
}

/// Session-level event, decoupled from the client library's event type so
/// the controller can be exercised against a mock backend.
pub enum SessionEvent {
	DeviceAdded(DiscoveredDevice),
	DeviceRemoved { index: u32 },
	ScanningFinished,
	Disconnected,
}

/// A device the backend reported, reduced to what the bridge consumes.
pub struct DiscoveredDevice {
	pub index: u32,
	pub name: String,
	pub class: DeviceClass,
	pub actuator: Arc<dyn Actuator>,
}

/// Backend seam over the client library.
///
/// `subscribe` must be callable before `connect`: a server may report
/// pre-existing devices immediately upon connect, and those events land on
/// subscriptions taken beforehand.
pub trait ControlBackend: Send + Sync {
	fn subscribe(&self) -> BoxStream<'static, SessionEvent>;
	fn connect<'a>(&'a self, mode: &'a ConnectMode) -> BoxFuture<'a, Result<()>>;
	fn start_scanning(&self) -> BoxFuture<'_, Result<()>>;
	fn stop_scanning(&self) -> BoxFuture<'_, Result<()>>;
}

/// Roster entry rendered to the operator for each discovery.
#[derive(Clone, Debug)]
pub struct RosterEntry {
	pub index: u32,
	pub name: String,
	pub class: DeviceClass,
}

/// Guards the backend's stop-scanning request so it fires exactly once per
/// session, instead of once per discovery.
#[derive(Debug, Default)]
pub struct ScanLatch {
	stopped: bool,
}

impl ScanLatch {
	/// Returns true exactly once.
	pub fn arm(&mut self) -> bool {
		!std::mem::replace(&mut self.stopped, true)
	}
}

/// Hook invoked for every roster entry as it is appended.
pub type DiscoveryHook = Box<dyn Fn(&RosterEntry) + Send + Sync>;

pub struct SessionController<B: ControlBackend> {
	backend: B,
	config: BridgeConfig,
	mode: ConnectMode,
	pattern: Option<Vec<PulseStep>>,
	relay: Arc<RelayListener>,
	roster: Mutex<Vec<RosterEntry>>,
	bound: Mutex<Vec<Arc<dyn Actuator>>>,
	players: Mutex<Vec<PatternPlayer>>,
	on_discovery: Option<DiscoveryHook>,
}

impl<B: ControlBackend> SessionController<B> {
	pub fn new(
		backend: B,
		config: BridgeConfig,
		mode: ConnectMode,
		pattern: Option<Vec<PulseStep>>,
	) -> Self {
		Self {
			backend,
			config,
			mode,
			pattern,
			relay: Arc::new(RelayListener::new()),
			roster: Mutex::new(Vec::new()),
			bound: Mutex::new(Vec::new()),
			players: Mutex::new(Vec::new()),
			on_discovery: None,
		}
	}

	/// Sets the hook invoked for every appended roster entry.
	pub fn with_discovery_hook(mut self, hook: DiscoveryHook) -> Self {
		self.on_discovery = Some(hook);
		self
	}

	/// Runs the full session sequence until the backend disconnects.
	///
	/// A connection failure aborts the sequence: no relay listener is
	/// started and no scan is requested.
	pub async fn run(&self) -> Result<()> {
		// Subscribe strictly before connecting; the server may report
		// pre-existing devices in the same breath as the handshake.
		let mut events = self.backend.subscribe();
		self.backend.connect(&self.mode).await?;
		info!(target: "buzzbridge::session", mode = %self.mode, "connected");

		// The relay runs regardless of mode; its lifetime is the session's.
		let relay = Arc::clone(&self.relay);
		let relay_url = self.config.relay_url.clone();
		tokio::spawn(async move {
			if let Err(err) = relay.run(&relay_url).await {
				warn!(target: "buzzbridge::relay", error = %err, "relay listener ended");
			}
		});

		self.backend.start_scanning().await?;
		debug!(target: "buzzbridge::session", "scanning started");

		let mut latch = ScanLatch::default();
		while let Some(event) = events.next().await {
			match event {
				SessionEvent::DeviceAdded(device) => {
					self.on_device_added(device);
					// One device is good enough; stop looking for more.
					if latch.arm() {
						if let Err(err) = self.backend.stop_scanning().await {
							warn!(target: "buzzbridge::session", error = %err, "stop-scanning failed");
						}
					}
				}
				SessionEvent::DeviceRemoved { index } => {
					self.roster.lock().retain(|entry| entry.index != index);
					info!(target: "buzzbridge::session", index, "device removed");
				}
				SessionEvent::ScanningFinished => {
					debug!(target: "buzzbridge::session", "scanning finished");
				}
				SessionEvent::Disconnected => {
					info!(target: "buzzbridge::session", "server disconnected");
					break;
				}
			}
		}
		Ok(())
	}

	fn on_device_added(&self, device: DiscoveredDevice) {
		info!(
			target: "buzzbridge::session",
			device = %device.name,
			class = %device.class,
			"device discovered"
		);
		let entry = RosterEntry {
			index: device.index,
			name: device.name.clone(),
			class: device.class,
		};
		if let Some(hook) = &self.on_discovery {
			hook(&entry);
		}
		self.roster.lock().push(entry);

		if !device.class.is_vibrate() {
			return;
		}

		let player = PatternPlayer::spawn(Arc::clone(&device.actuator));
		match &self.pattern {
			Some(steps) => player.enqueue_all(steps),
			None => self.spawn_relay_binding(Arc::clone(&device.actuator)),
		}
		self.players.lock().push(player);
		self.bound.lock().push(device.actuator);
	}

	/// Couples one device to its own relay subscription. Each binding holds
	/// an independent receiver, so concurrent discoveries never overwrite
	/// one another's handler.
	fn spawn_relay_binding(&self, actuator: Arc<dyn Actuator>) {
		let mut rx = self.relay.subscribe();
		let factor = self.config.vibrate_factor;
		let hold = self.config.relay_hold();
		tokio::spawn(async move {
			loop {
				match rx.recv().await {
					Ok(raw) => {
						let intensity = scale_intensity(raw, factor);
						if let Err(err) = pulse(Arc::clone(&actuator), intensity, hold).await {
							warn!(
								target: "buzzbridge::session",
								device = actuator.name(),
								error = %err,
								"relay-driven vibrate failed"
							);
						}
					}
					Err(RecvError::Lagged(skipped)) => {
						warn!(
							target: "buzzbridge::session",
							device = actuator.name(),
							skipped,
							"relay binding lagged; dropping stale values"
						);
					}
					Err(RecvError::Closed) => break,
				}
			}
		});
	}

	/// Manual trigger: a fixed-intensity pulse on every bound device.
	/// Returns how many devices were pulsed.
	pub async fn pulse_all(&self) -> usize {
		let actuators: Vec<_> = self.bound.lock().clone();
		for actuator in &actuators {
			if let Err(err) = pulse(
				Arc::clone(actuator),
				self.config.manual_intensity,
				self.config.manual_hold(),
			)
			.await
			{
				warn!(
					target: "buzzbridge::session",
					device = actuator.name(),
					error = %err,
					"manual pulse failed"
				);
			}
		}
		actuators.len()
	}

	/// Queues a built-in pattern on every bound device. Returns false when
	/// the name is unknown.
	pub fn play_pattern(&self, name: &str) -> bool {
		let Some(steps) = crate::pattern::builtin(name) else {
			return false;
		};
		for player in self.players.lock().iter() {
			player.enqueue_all(&steps);
		}
		true
	}

	/// Snapshot of the discovered-device roster.
	pub fn roster(&self) -> Vec<RosterEntry> {
		self.roster.lock().clone()
	}
}

/// [`ControlBackend`] over a real client-library session.
pub struct ButtplugBackend {
	client: ButtplugClient,
}

impl ButtplugBackend {
	pub fn new(client_name: &str) -> Self {
		Self {
			client: ButtplugClient::new(client_name),
		}
	}
}

impl ControlBackend for ButtplugBackend {
	fn subscribe(&self) -> BoxStream<'static, SessionEvent> {
		self.client
			.event_stream()
			.filter_map(|event| async move {
				match event {
					ButtplugClientEvent::DeviceAdded(device) => {
						let class =
							DeviceClass::from_vibrate_actuators(device.vibrate_attributes().len());
						Some(SessionEvent::DeviceAdded(DiscoveredDevice {
							index: device.index(),
							name: device.name().clone(),
							class,
							actuator: Arc::new(ButtplugActuator::new(device)),
						}))
					}
					ButtplugClientEvent::DeviceRemoved(device) => Some(SessionEvent::DeviceRemoved {
						index: device.index(),
					}),
					ButtplugClientEvent::ScanningFinished => Some(SessionEvent::ScanningFinished),
					ButtplugClientEvent::ServerDisconnect => Some(SessionEvent::Disconnected),
					ButtplugClientEvent::Error(err) => {
						warn!(target: "buzzbridge::session", error = %err, "backend error event");
						None
					}
					_ => None,
				}
			})
			.boxed()
	}

	fn connect<'a>(&'a self, mode: &'a ConnectMode) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			match mode {
				ConnectMode::Remote(address) => {
					let connector = new_json_ws_client_connector(address);
					self.client
						.connect(connector)
						.await
						.map_err(BridgeError::Connect)
				}
				ConnectMode::Embedded => {
					let server = ButtplugServerBuilder::default()
						.finish()
						.map_err(|err| BridgeError::Embedded(err.to_string()))?;
					let connector = ButtplugInProcessClientConnectorBuilder::default()
						.server(server)
						.finish();
					self.client
						.connect(connector)
						.await
						.map_err(BridgeError::Connect)
				}
			}
		})
	}

	fn start_scanning(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.client
				.start_scanning()
				.await
				.map_err(BridgeError::Command)
		})
	}

	fn stop_scanning(&self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			self.client
				.stop_scanning()
				.await
				.map_err(BridgeError::Command)
		})
	}
}
