//! Inbound numeric control channel.
//!
//! The relay is a plain WebSocket delivering UTF-8 text frames, each
//! parseable as an intensity value. Frames are fanned out on a broadcast
//! channel; every vibrate-capable device holds its own receiver, so a late
//! discovery never steals an earlier device's subscription.

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Fan-out capacity; lagging receivers drop the oldest values.
const RELAY_CHANNEL_CAPACITY: usize = 32;

pub type RelayReceiver = broadcast::Receiver<f64>;

/// Reads the relay socket and broadcasts parsed intensity values.
pub struct RelayListener {
	tx: broadcast::Sender<f64>,
}

impl RelayListener {
	pub fn new() -> Self {
		let (tx, _) = broadcast::channel(RELAY_CHANNEL_CAPACITY);
		Self { tx }
	}

	/// New independent subscription. Values sent before the subscription are
	/// never replayed.
	pub fn subscribe(&self) -> RelayReceiver {
		self.tx.subscribe()
	}

	/// Connects to `url` and pumps frames until the socket closes.
	///
	/// Non-numeric frames are logged and dropped. There is no reconnection;
	/// a closed or failed socket ends the listener.
	pub async fn run(&self, url: &str) -> Result<()> {
		let (socket, _response) = connect_async(url).await?;
		info!(target: "buzzbridge::relay", url, "relay connected");

		let (_write, mut read) = socket.split();
		while let Some(frame) = read.next().await {
			match frame {
				Ok(Message::Text(text)) => match parse_intensity(&text) {
					Some(value) => {
						debug!(target: "buzzbridge::relay", value, "relay value");
						self.send(value);
					}
					None => {
						warn!(
							target: "buzzbridge::relay",
							frame = %text,
							"discarding non-numeric relay frame"
						);
					}
				},
				Ok(Message::Close(_)) => break,
				Ok(_) => {}
				// Logged once by the caller that owns the listener task.
				Err(err) => return Err(err.into()),
			}
		}

		info!(target: "buzzbridge::relay", "relay disconnected");
		Ok(())
	}

	pub(crate) fn send(&self, value: f64) {
		// Errors only mean no receiver is currently subscribed.
		let _ = self.tx.send(value);
	}
}

impl Default for RelayListener {
	fn default() -> Self {
		Self::new()
	}
}

/// Parses a relay text frame as an intensity value.
pub fn parse_intensity(frame: &str) -> Option<f64> {
	frame.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use futures_util::SinkExt;
	use tokio::net::TcpListener;
	use tokio_tungstenite::accept_async;

	use super::*;

	#[test]
	fn numeric_frames_parse() {
		assert_eq!(parse_intensity("0.5"), Some(0.5));
		assert_eq!(parse_intensity(" 1 \n"), Some(1.0));
		assert_eq!(parse_intensity("0"), Some(0.0));
	}

	#[test]
	fn garbage_frames_do_not_parse() {
		assert_eq!(parse_intensity("strong"), None);
		assert_eq!(parse_intensity(""), None);
		assert_eq!(parse_intensity("NaN"), None);
		assert_eq!(parse_intensity("inf"), None);
	}

	#[tokio::test]
	async fn listener_broadcasts_numeric_frames_and_skips_garbage() {
		let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = server.local_addr().unwrap();

		tokio::spawn(async move {
			let (stream, _) = server.accept().await.unwrap();
			let mut socket = accept_async(stream).await.unwrap();
			socket.send(Message::text("0.5")).await.unwrap();
			socket.send(Message::text("strong")).await.unwrap();
			socket.send(Message::text("0.25")).await.unwrap();
			socket.send(Message::Close(None)).await.unwrap();
		});

		let listener = Arc::new(RelayListener::new());
		// Subscribe before the pump starts so no frame is missed.
		let mut rx = listener.subscribe();
		let pump = {
			let listener = Arc::clone(&listener);
			tokio::spawn(async move { listener.run(&format!("ws://{addr}/")).await })
		};

		assert_eq!(rx.recv().await.unwrap(), 0.5);
		// The garbage frame is dropped, not delivered as an error.
		assert_eq!(rx.recv().await.unwrap(), 0.25);

		pump.await.unwrap().unwrap();
	}

	#[tokio::test]
	async fn abrupt_disconnect_surfaces_as_an_error() {
		let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = server.local_addr().unwrap();

		tokio::spawn(async move {
			let (stream, _) = server.accept().await.unwrap();
			let socket = accept_async(stream).await.unwrap();
			// Drop the stream without a close handshake.
			drop(socket);
		});

		let listener = RelayListener::new();
		let result = listener.run(&format!("ws://{addr}/")).await;
		assert!(matches!(result, Err(crate::error::BridgeError::Relay(_))));
	}
}
