use buttplug::client::ButtplugClientError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
	/// Connection to the device-control backend could not be established.
	/// The session sequence is abandoned when this is returned; there is no
	/// retry path.
	#[error("connection failed: {0}")]
	Connect(#[source] ButtplugClientError),

	#[error("embedded server setup failed: {0}")]
	Embedded(String),

	#[error("device command failed: {0}")]
	Command(#[source] ButtplugClientError),

	#[error("relay connection failed: {0}")]
	Relay(#[from] tokio_tungstenite::tungstenite::Error),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
