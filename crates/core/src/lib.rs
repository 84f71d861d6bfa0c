//! Relay-driven device vibration bridge.
//!
//! Discovers controllable devices through the client library, listens to a
//! secondary WebSocket for numeric intensity values, and forwards each value
//! to every vibrate-capable device as a timed vibrate/stop pair. The wire
//! protocol, device enumeration, and transport handling all belong to the
//! client library; this crate is the glue around it.

pub mod actuator;
pub mod capability;
pub mod config;
pub mod error;
pub mod pattern;
pub mod pulse;
pub mod relay;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use session::{ButtplugBackend, ConnectMode, ControlBackend, SessionController};
