//! Tests for the real-time channel against a local WebSocket server

use beacon_protocol::IdentityToken;
use beacon_runtime::{ChannelConnector, ChannelEvent, RtaConnector};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

fn token() -> IdentityToken {
	IdentityToken {
		owner_id: "2535".into(),
		hash_secret: "hash".into(),
		security_token: "sts".into(),
		expires_at: u64::MAX,
	}
}

#[tokio::test]
async fn subscribes_and_surfaces_connection_id_then_close() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut auth = None;
		let ws = tokio_tungstenite::accept_hdr_async(stream, |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
			auth = req.headers().get("authorization").map(|v| v.to_str().unwrap().to_string());
			Ok(resp)
		})
		.await
		.unwrap();
		let (mut ws_tx, mut ws_rx) = ws.split();

		let subscribe = ws_rx.next().await.unwrap().unwrap();
		assert_eq!(
			subscribe,
			Message::Text(r#"[1,1,"https://sessiondirectory.xboxlive.com/connections/"]"#.into())
		);

		ws_tx.send(Message::Text("[3,9,{\"shoulder\":\"tap\"}]".into())).await.unwrap();
		ws_tx
			.send(Message::Text(r#"[1,1,0,9,{"ConnectionId":"abc123"}]"#.into()))
			.await
			.unwrap();
		ws_tx
			.send(Message::Close(Some(CloseFrame {
				code: CloseCode::Away,
				reason: "maintenance".into(),
			})))
			.await
			.unwrap();
		auth
	});

	let connector = RtaConnector::new(format!("ws://{addr}"));
	let (_handle, mut events) = connector.connect(&token()).await.unwrap();

	assert!(matches!(events.recv().await, Some(ChannelEvent::Message(_))));
	assert_eq!(events.recv().await, Some(ChannelEvent::ConnectionId("abc123".into())));
	assert_eq!(
		events.recv().await,
		Some(ChannelEvent::Closed {
			code: Some(1001),
			reason: "maintenance".into()
		})
	);
	assert_eq!(events.recv().await, None);

	let auth = server.await.unwrap();
	assert_eq!(auth.as_deref(), Some("XBL3.0 x=hash;sts"));
}

#[tokio::test]
async fn dropped_connection_surfaces_terminal_event() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();

	let server = tokio::spawn(async move {
		let (stream, _) = listener.accept().await.unwrap();
		let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
		let _subscribe = ws.next().await;
		drop(ws);
	});

	let connector = RtaConnector::new(format!("ws://{addr}"));
	let (_handle, mut events) = connector.connect(&token()).await.unwrap();
	server.await.unwrap();

	let event = events.recv().await.expect("terminal event");
	assert!(event.is_terminal(), "unexpected event {event:?}");
}

#[tokio::test]
async fn refused_connection_is_an_error() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let connector = RtaConnector::new(format!("ws://{addr}"));
	assert!(connector.connect(&token()).await.is_err());
}
