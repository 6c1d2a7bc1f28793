//! Real-time activity channel.
//!
//! One authenticated WebSocket per lifecycle instance. On open the client
//! subscribes to the connections resource; the server answers with the
//! connection id the session record has to reference. Close and error are
//! surfaced once and end the channel. There is no reconnect here: the owner
//! decides what a lost channel means.

use async_trait::async_trait;
use beacon_protocol::{CONNECTIONS_RESOURCE, IdentityToken, RtaFrame, parse_frame, subscribe_frame};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Receiver side of a connected channel.
pub type InboundEvents = mpsc::UnboundedReceiver<ChannelEvent>;

/// Notification surfaced by the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
	/// The platform assigned this connection an id.
	ConnectionId(String),
	/// Any other frame, forwarded for diagnostics.
	Message(Value),
	/// The socket closed. Terminal.
	Closed { code: Option<u16>, reason: String },
	/// The socket failed. Terminal.
	Error(String),
}

impl ChannelEvent {
	/// Returns `true` for events after which no more events arrive.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Closed { .. } | Self::Error(_))
	}
}

/// Owns the background tasks of one connection; dropping it stops them.
#[derive(Debug, Default)]
pub struct ChannelHandle {
	tasks: Vec<AbortHandle>,
}

impl ChannelHandle {
	/// Wraps the abort handles of tasks serving one connection.
	pub fn new(tasks: Vec<AbortHandle>) -> Self {
		Self { tasks }
	}

	/// Stops the connection's tasks.
	pub fn close(&mut self) {
		for task in self.tasks.drain(..) {
			task.abort();
		}
	}
}

impl Drop for ChannelHandle {
	fn drop(&mut self) {
		self.close();
	}
}

/// Opens real-time channels.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
	/// Connects and subscribes. Events arrive on the returned receiver until a
	/// terminal event or until the handle is dropped.
	async fn connect(&self, token: &IdentityToken) -> Result<(ChannelHandle, InboundEvents)>;
}

/// [`ChannelConnector`] for the platform's real-time activity socket.
#[derive(Debug, Clone)]
pub struct RtaConnector {
	url: String,
}

impl RtaConnector {
	pub fn new(url: impl Into<String>) -> Self {
		Self { url: url.into() }
	}
}

#[async_trait]
impl ChannelConnector for RtaConnector {
	async fn connect(&self, token: &IdentityToken) -> Result<(ChannelHandle, InboundEvents)> {
		let mut request = self.url.as_str().into_client_request()?;
		let auth = HeaderValue::from_str(&token.authorization_header()).map_err(|e| Error::InvalidHeader(e.to_string()))?;
		request.headers_mut().insert(AUTHORIZATION, auth);

		let (mut ws, _) = connect_async(request).await?;
		debug!(target = "beacon.channel", url = %self.url, "connected");

		ws.send(Message::Text(subscribe_frame(1, CONNECTIONS_RESOURCE))).await?;
		debug!(target = "beacon.channel", resource = CONNECTIONS_RESOURCE, "subscribe sent");

		let (tx, rx) = mpsc::unbounded_channel();
		let reader = tokio::spawn(async move {
			let terminal = loop {
				match ws.next().await {
					Some(Ok(Message::Text(text))) => {
						if let Some(event) = classify(&text) {
							if tx.send(event).is_err() {
								return;
							}
						}
					}
					Some(Ok(Message::Close(frame))) => {
						break match frame {
							Some(frame) => ChannelEvent::Closed {
								code: Some(u16::from(frame.code)),
								reason: frame.reason.to_string(),
							},
							None => ChannelEvent::Closed {
								code: None,
								reason: String::new(),
							},
						};
					}
					Some(Ok(_)) => {}
					Some(Err(err)) => break ChannelEvent::Error(err.to_string()),
					None => {
						break ChannelEvent::Closed {
							code: None,
							reason: "stream ended".to_string(),
						};
					}
				}
			};
			let _ = tx.send(terminal);
		});

		Ok((ChannelHandle::new(vec![reader.abort_handle()]), rx))
	}
}

fn classify(text: &str) -> Option<ChannelEvent> {
	match parse_frame(text) {
		Ok(RtaFrame::ConnectionId(id)) => Some(ChannelEvent::ConnectionId(id)),
		Ok(RtaFrame::Other(value)) => Some(ChannelEvent::Message(value)),
		Err(err) => {
			warn!(target = "beacon.channel", error = %err, frame = %text, "unparsable frame");
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn classify_surfaces_connection_id() {
		assert_eq!(
			classify(r#"[1,1,0,5,{"ConnectionId":"abc123"}]"#),
			Some(ChannelEvent::ConnectionId("abc123".to_string()))
		);
	}

	#[test]
	fn classify_forwards_other_frames() {
		assert!(matches!(classify("[3,5,{}]"), Some(ChannelEvent::Message(_))));
		assert_eq!(classify("garbage"), None);
	}

	#[test]
	fn terminal_events() {
		assert!(ChannelEvent::Error("x".into()).is_terminal());
		assert!(
			ChannelEvent::Closed {
				code: None,
				reason: String::new()
			}
			.is_terminal()
		);
		assert!(!ChannelEvent::ConnectionId("a".into()).is_terminal());
	}

	#[tokio::test]
	async fn dropping_handle_aborts_tasks() {
		let task = tokio::spawn(std::future::pending::<()>());
		let abort = task.abort_handle();
		drop(ChannelHandle::new(vec![abort]));
		let joined = task.await;
		assert!(joined.unwrap_err().is_cancelled());
	}
}
